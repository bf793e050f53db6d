//! Reshaper: folds one table's dated columns into the country set.
//!
//! ```text
//! Province/State,Country/Region,1/22/20       china.date.infected
//! Hubei,China,444                        →    { "2020-01-22": 470 }
//! Guangdong,China,26
//! ```

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{Metric, Snapshot};
use crate::parser::SourceTable;

use super::keys::{is_date_header, normalize_country_key, parse_count, parse_date_header};

/// A cell under a date column that did not hold a count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedCell {
    pub line: usize,
    pub header: String,
    pub value: String,
}

/// What happened while reshaping one table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReshapeReport {
    pub metric: Option<Metric>,
    /// Date columns folded into the series
    pub date_columns: usize,
    /// Headers matching the date pattern that name no calendar date
    pub invalid_date_headers: Vec<String>,
    /// Rows accumulated into a blueprint record
    pub merged_rows: usize,
    /// Merged rows that carried a province or state
    pub subregion_rows: usize,
    /// Country names whose key is not in the blueprint
    pub dropped_countries: BTreeSet<String>,
    pub dropped_rows: usize,
    pub malformed_cells: Vec<MalformedCell>,
    /// Counts left out because the running sum would exceed `u64`
    pub overflowed_cells: Vec<MalformedCell>,
}

/// Accumulate `table` into `snapshot` under `metric`.
///
/// Cells for the same (country, date) are summed across rows, so
/// sub-national rows add up to the national series. Rows whose key is not
/// already in `snapshot` are dropped; no record is ever created here.
pub fn reshape(table: &SourceTable, snapshot: &mut Snapshot, metric: Metric) -> ReshapeReport {
    let mut report = ReshapeReport {
        metric: Some(metric),
        ..ReshapeReport::default()
    };

    let mut date_columns = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        match parse_date_header(header) {
            Some(date) => date_columns.push((idx, date)),
            None if is_date_header(header) => report.invalid_date_headers.push(header.clone()),
            None => {}
        }
    }
    report.date_columns = date_columns.len();

    for row in &table.rows {
        let key = normalize_country_key(&row.country);
        let record = match snapshot.get_mut(&key) {
            Some(record) => record,
            None => {
                report.dropped_rows += 1;
                report.dropped_countries.insert(row.country.clone());
                continue;
            }
        };

        for (idx, date) in &date_columns {
            let Some((header, value)) = row.cells.get(*idx) else {
                continue;
            };
            let cell = || MalformedCell {
                line: row.line,
                header: header.clone(),
                value: value.clone(),
            };
            match parse_count(value) {
                Some(count) => {
                    if !record.date.accumulate(metric, date, count) {
                        report.overflowed_cells.push(cell());
                    }
                }
                None => report.malformed_cells.push(cell()),
            }
        }
        report.merged_rows += 1;
        if row.province.is_some() {
            report.subregion_rows += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use crate::transform::blueprint::build_blueprint;
    use std::path::Path;

    fn table(csv: &str) -> SourceTable {
        parse_table(Path::new("test.csv"), csv, ',', "utf-8".to_string()).unwrap()
    }

    #[test]
    fn test_single_row() {
        let cases = table("Country/Region,1/22/20,1/23/20\nFoo,10,20\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        let infected = &snapshot.get("foo").unwrap().date.infected;
        assert_eq!(infected.len(), 2);
        assert_eq!(infected["2020-01-22"], 10);
        assert_eq!(infected["2020-01-23"], 20);
        assert_eq!(report.date_columns, 2);
        assert_eq!(report.merged_rows, 1);
    }

    #[test]
    fn test_province_rows_are_summed() {
        let cases = table("Province/State,Country/Region,1/22/20\nA,Foo,5\nB,Foo,7\n");
        let mut snapshot = build_blueprint(&cases.rows);

        reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(snapshot.get("foo").unwrap().date.infected["2020-01-22"], 12);
    }

    #[test]
    fn test_subregion_rows_are_counted() {
        let cases = table("Province/State,Country/Region,1/22/20\nA,Foo,5\n,Bar,7\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(report.merged_rows, 2);
        assert_eq!(report.subregion_rows, 1);
    }

    #[test]
    fn test_overflowing_sum_keeps_first_count() {
        let cases = table("Country/Region,1/22/20\nFoo,18446744073709551615\nFoo,1\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(snapshot.get("foo").unwrap().date.infected["2020-01-22"], u64::MAX);
        assert_eq!(report.overflowed_cells.len(), 1);
        assert_eq!(report.overflowed_cells[0].line, 3);
        assert_eq!(report.overflowed_cells[0].value, "1");
        assert!(report.malformed_cells.is_empty());
    }

    #[test]
    fn test_padded_country_shares_key() {
        let cases = table("Country/Region,1/22/20\nFoo,2\n\" Foo \",3\n");
        let mut snapshot = build_blueprint(&cases.rows);

        reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("foo").unwrap().date.infected["2020-01-22"], 5);
    }

    #[test]
    fn test_exponent_cell_is_malformed() {
        let cases = table("Country/Region,1/22/20\nFoo,1e3\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        assert!(snapshot.get("foo").unwrap().date.infected.is_empty());
        assert_eq!(report.malformed_cells[0].value, "1e3");
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let forward = table("Province/State,Country/Region,1/22/20\nA,Foo,5\nB,Foo,7\n");
        let backward = table("Province/State,Country/Region,1/22/20\nB,Foo,7\nA,Foo,5\n");

        let mut a = build_blueprint(&forward.rows);
        reshape(&forward, &mut a, Metric::Infected);
        let mut b = build_blueprint(&backward.rows);
        reshape(&backward, &mut b, Metric::Infected);

        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_country_is_dropped() {
        let cases = table("Country/Region,1/22/20\nFoo,10\n");
        let deaths = table("Country/Region,1/22/20\nFoo,1\nBar,3\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&deaths, &mut snapshot, Metric::Deaths);

        assert!(!snapshot.contains_key("bar"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(report.dropped_rows, 1);
        assert!(report.dropped_countries.contains("Bar"));
        assert_eq!(snapshot.get("foo").unwrap().date.deaths["2020-01-22"], 1);
    }

    #[test]
    fn test_non_date_columns_ignored() {
        let cases = table("Province/State,Country/Region,Lat,Long,1/22/20\n,Foo,1.5,2.5,4\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(report.date_columns, 1);
        assert_eq!(snapshot.get("foo").unwrap().date.infected.len(), 1);
    }

    #[test]
    fn test_malformed_cells_are_reported_not_accumulated() {
        let cases = table("Country/Region,1/22/20,1/23/20,1/24/20\nFoo,3,,abc\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        let infected = &snapshot.get("foo").unwrap().date.infected;
        assert_eq!(infected.len(), 1);
        assert_eq!(report.malformed_cells.len(), 2);
        assert_eq!(report.malformed_cells[0].header, "1/23/20");
        assert_eq!(report.malformed_cells[1].value, "abc");
        assert_eq!(report.malformed_cells[1].line, 2);
    }

    #[test]
    fn test_invalid_calendar_header_is_skipped() {
        let cases = table("Country/Region,2/28/20,2/30/20\nFoo,1,2\n");
        let mut snapshot = build_blueprint(&cases.rows);

        let report = reshape(&cases, &mut snapshot, Metric::Infected);

        assert_eq!(report.invalid_date_headers, vec!["2/30/20".to_string()]);
        assert_eq!(snapshot.get("foo").unwrap().date.infected.len(), 1);
    }

    #[test]
    fn test_metrics_stay_separate() {
        let cases = table("Country/Region,1/22/20\nFoo,10\n");
        let recovered = table("Country/Region,1/22/20\nFoo,2\n");
        let mut snapshot = build_blueprint(&cases.rows);

        reshape(&cases, &mut snapshot, Metric::Infected);
        reshape(&recovered, &mut snapshot, Metric::Recovered);

        let record = snapshot.get("foo").unwrap();
        assert_eq!(record.date.infected["2020-01-22"], 10);
        assert_eq!(record.date.recovered["2020-01-22"], 2);
        assert!(record.date.deaths.is_empty());
    }
}
