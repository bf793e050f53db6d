//! Blueprint builder: fixes the country key space from the infection table.

use crate::models::Snapshot;
use crate::parser::SourceRow;

use super::keys::normalize_country_key;

/// Allocate one empty record per distinct country key in `rows`.
///
/// Only the infection table is passed here; death and recovery rows for keys
/// absent from the result are later dropped by the reshaper.
pub fn build_blueprint(rows: &[SourceRow]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for row in rows {
        snapshot.insert_blank(normalize_country_key(&row.country));
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, province: Option<&str>) -> SourceRow {
        SourceRow {
            line: 2,
            country: country.to_string(),
            province: province.map(String::from),
            cells: Vec::new(),
        }
    }

    #[test]
    fn test_one_record_per_key() {
        let rows = vec![
            row("China", Some("Hubei")),
            row("China", Some("Guangdong")),
            row("Korea, South", None),
        ];

        let snapshot = build_blueprint(&rows);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("china"));
        assert!(snapshot.contains_key("korea__south"));
    }

    #[test]
    fn test_names_collapsing_to_same_key() {
        let rows = vec![row("Foo Bar", None), row("foo-bar", None)];
        let snapshot = build_blueprint(&rows);
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["foo_bar"]);
    }

    #[test]
    fn test_records_start_empty() {
        let snapshot = build_blueprint(&[row("Foo", None)]);
        let record = snapshot.get("foo").unwrap();
        assert!(record.date.infected.is_empty());
        assert_eq!(record.total_infected, None);
        assert_eq!(record.mortality_rate, None);
    }
}
