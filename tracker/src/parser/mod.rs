//! Source reader: time-series CSV tables into validated rows.
//!
//! Encoding and delimiter are auto-detected, records are framed with the
//! `csv` crate, and every record is checked for a usable country cell before
//! it leaves this module. Nothing here knows about metrics or dates.

use std::path::{Path, PathBuf};

use crate::error::{MalformedRow, SourceError, SourceResult};

/// Accepted headers for the country column, in lookup order.
pub const COUNTRY_COLUMNS: &[&str] = &["Country/Region", "Country_Region"];

/// Accepted headers for the sub-national column, in lookup order.
pub const PROVINCE_COLUMNS: &[&str] = &["Province/State", "Province_State", "Province/States"];

/// One record of a source table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// 1-based line number of the record, header included
    pub line: usize,
    /// Raw country name, trimmed and never empty
    pub country: String,
    /// Sub-national name, when the table has one and the cell is filled
    pub province: Option<String>,
    /// `(header, value)` pairs in header order
    pub cells: Vec<(String, String)>,
}

/// A parsed source table with its detection metadata.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
    /// Records that could not be keyed
    pub rejected: Vec<MalformedRow>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding and drop a leading BOM.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Falls back to a comma when the line contains none of the candidates.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
}

/// Parse decoded CSV text into a [`SourceTable`].
///
/// `path` is only used to label errors and rejected rows.
pub fn parse_table(
    path: &Path,
    content: &str,
    delimiter: char,
    encoding: String,
) -> SourceResult<SourceTable> {
    if content.trim().is_empty() {
        return Err(SourceError::EmptyFile { path: path.to_path_buf() });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        // " Foo " and "Foo" must key the same country
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let country_idx = find_column(&headers, COUNTRY_COLUMNS).ok_or_else(|| SourceError::MissingColumn {
        path: path.to_path_buf(),
        column: COUNTRY_COLUMNS[0].to_string(),
    })?;
    let province_idx = find_column(&headers, PROVINCE_COLUMNS);

    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| SourceError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let country = record.get(country_idx).unwrap_or("");
        if country.is_empty() {
            rejected.push(MalformedRow {
                path: path.to_path_buf(),
                line,
                reason: format!("blank or missing '{}'", headers[country_idx]),
            });
            continue;
        }

        let province = province_idx
            .and_then(|i| record.get(i))
            .filter(|p| !p.is_empty())
            .map(String::from);

        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();

        rows.push(SourceRow {
            line,
            country: country.to_string(),
            province,
            cells,
        });
    }

    Ok(SourceTable {
        path: path.to_path_buf(),
        encoding,
        delimiter,
        headers,
        rows,
        rejected,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(path: &Path, bytes: &[u8]) -> SourceResult<SourceTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_table(path, &content, delimiter, encoding)
}

/// Read and parse a source table.
///
/// Any IO failure becomes [`SourceError::Unavailable`]; there is no retry.
pub async fn read_source(path: &Path) -> SourceResult<SourceTable> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes_auto(path, &bytes)
}
