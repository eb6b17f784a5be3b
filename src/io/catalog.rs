//! Galaxy catalog CSV ingest.
//!
//! This module turns a catalog export into `CatalogRow`s. Design goals:
//! - **Lenient schema**: only the position pair and/or the redshift pair must exist
//! - **Row-level validation**: bad cells become `RowError`s, the rest of the row survives
//! - **Encoding tolerance**: non-UTF-8 files are decoded as Latin-1
//! - **Separation of concerns**: no projection or statistics here

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{debug, warn};

use crate::domain::{CatalogConfig, CatalogRow};
use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed rows + problems + which column pairs exist.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub rows: Vec<CatalogRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub has_positions: bool,
    pub has_redshifts: bool,
}

impl Catalog {
    /// Rows carrying both RA and Dec.
    pub fn with_positions(&self) -> usize {
        self.rows.iter().filter(|r| r.position().is_some()).count()
    }

    /// Rows carrying both redshift estimates.
    pub fn with_redshifts(&self) -> usize {
        self.rows.iter().filter(|r| r.redshifts().is_some()).count()
    }
}

/// Load a catalog CSV from disk.
pub fn load_catalog(path: &Path, config: &CatalogConfig) -> Result<Catalog, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open catalog '{}': {e}", path.display())))?;
    let catalog = read_catalog(file, config)?;
    debug!(
        "catalog {}: {} rows read, {} with positions, {} with both redshifts",
        path.display(),
        catalog.rows_read,
        catalog.with_positions(),
        catalog.with_redshifts()
    );
    Ok(catalog)
}

/// Parse a catalog from any reader.
pub fn read_catalog<R: Read>(mut reader: R, config: &CatalogConfig) -> Result<Catalog, AppError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| AppError::new(2, format!("Failed to read catalog: {e}")))?;
    let text = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read catalog headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let columns = Columns::resolve(config, &header_map)?;

    let mut catalog = Catalog {
        has_positions: columns.ra.is_some() && columns.dec.is_some(),
        has_redshifts: columns.phot.is_some() && columns.spec.is_some(),
        ..Catalog::default()
    };

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based.
        let line = idx + 2;
        catalog.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                catalog.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let (row, problems) = parse_row(&record, &columns, line);
        catalog
            .row_errors
            .extend(problems.into_iter().map(|message| RowError { line, message }));
        catalog.rows.push(row);
    }

    if !catalog.row_errors.is_empty() {
        warn!("{} catalog cells could not be used", catalog.row_errors.len());
    }
    Ok(catalog)
}

/// UTF-8 when valid, otherwise Latin-1 (every byte is one code point).
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Column indices resolved against the header.
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: Option<usize>,
    ra: Option<usize>,
    dec: Option<usize>,
    phot: Option<usize>,
    spec: Option<usize>,
}

impl Columns {
    fn resolve(config: &CatalogConfig, header_map: &HashMap<String, usize>) -> Result<Self, AppError> {
        let find = |name: &str| header_map.get(&normalize_header_name(name)).copied();

        let id = match &config.id_column {
            Some(name) => Some(find(name).ok_or_else(|| {
                AppError::new(2, format!("Catalog has no id column `{name}`."))
            })?),
            None => ["id", "seq", "name"].into_iter().find_map(find),
        };

        let columns = Self {
            id,
            ra: find(&config.ra_column),
            dec: find(&config.dec_column),
            phot: find(&config.phot_column),
            spec: find(&config.spec_column),
        };

        let positions = columns.ra.is_some() && columns.dec.is_some();
        let redshifts = columns.phot.is_some() && columns.spec.is_some();
        if !positions && !redshifts {
            return Err(AppError::new(
                2,
                format!(
                    "Catalog has neither position columns (`{}`, `{}`) nor redshift columns (`{}`, `{}`).",
                    config.ra_column, config.dec_column, config.phot_column, config.spec_column
                ),
            ));
        }
        Ok(columns)
    }
}

fn parse_row(record: &StringRecord, columns: &Columns, line: usize) -> (CatalogRow, Vec<String>) {
    let mut problems = Vec::new();
    let mut field = |idx: Option<usize>, what: &str, parse: fn(&str) -> Option<f64>| -> Option<f64> {
        let raw = get_optional(record, idx)?;
        let value = parse(raw);
        if value.is_none() {
            problems.push(format!("Invalid {what} '{raw}'."));
        }
        value
    };

    let ra = field(columns.ra, "right ascension", parse_ra);
    let dec = field(columns.dec, "declination", parse_dec);
    let z_phot = field(columns.phot, "photometric redshift", parse_redshift);
    let z_spec = field(columns.spec, "spectroscopic redshift", parse_redshift);

    let row = CatalogRow {
        line,
        id: get_optional(record, columns.id).map(str::to_string),
        ra,
        dec,
        z_phot,
        z_spec,
    };
    (row, problems)
}

/// Cell text that stands for a missing value, matched case-insensitively.
const MISSING_TOKENS: [&str; 8] = ["nan", "-nan", "na", "n/a", "#n/a", "<na>", "null", "none"];

fn is_missing(s: &str) -> bool {
    s.is_empty() || MISSING_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

fn get_optional(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !is_missing(s))
}

/// Redshift must be finite and `> -1` (so `1 + z` is positive).
fn parse_redshift(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|z| z.is_finite() && *z > -1.0)
}

/// RA in decimal degrees or sexagesimal hours (`hh mm ss.s` / `hh:mm:ss.s`).
pub fn parse_ra(s: &str) -> Option<f64> {
    let deg = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => parse_sexagesimal(s)? * 15.0,
    };
    (deg.is_finite() && (0.0..360.0).contains(&deg)).then_some(deg)
}

/// Dec in decimal degrees or sexagesimal degrees (`±dd mm ss.s` / `±dd:mm:ss.s`).
pub fn parse_dec(s: &str) -> Option<f64> {
    let deg = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => parse_sexagesimal(s)?,
    };
    (deg.is_finite() && (-90.0..=90.0).contains(&deg)).then_some(deg)
}

/// `[±]a b [c]` -> `a + b/60 + c/3600`, sign applied to the whole value.
fn parse_sexagesimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let negative = s.starts_with('-');
    let parts: Vec<&str> = s
        .trim_start_matches(['+', '-'])
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let whole: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = match parts.get(2) {
        Some(p) => p.parse().ok()?,
        None => 0.0,
    };
    if whole < 0.0 || !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let value = whole + minutes / 60.0 + seconds / 3600.0;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Catalog {
        read_catalog(text.as_bytes(), &CatalogConfig::default()).unwrap()
    }

    #[test]
    fn rows_missing_a_field_are_kept_for_other_operations() {
        let cat = read(concat!(
            "Seq,RAJ2000,DEJ2000,Photometric_Redshift,Spectroscopic_Redshift\n",
            "1,53.1625,-27.7914,1.20,1.18\n",
            "2,53.1600,-27.7800,0.55,\n",
            "3,,,2.10,2.31\n",
        ));
        assert_eq!(cat.rows_read, 3);
        assert_eq!(cat.with_positions(), 2);
        assert_eq!(cat.with_redshifts(), 2);
        assert!(cat.row_errors.is_empty());
        assert_eq!(cat.rows[0].id.as_deref(), Some("1"));
        assert_eq!(cat.rows[2].redshifts(), Some((2.10, 2.31)));
        assert_eq!(cat.rows[2].line, 4);
    }

    #[test]
    fn headers_match_case_insensitively_with_bom() {
        let cat = read("\u{feff}raj2000,DEJ2000\n10.0,20.0\n");
        assert!(cat.has_positions);
        assert!(!cat.has_redshifts);
        assert_eq!(cat.rows[0].position(), Some((10.0, 20.0)));
    }

    #[test]
    fn invalid_cells_become_row_errors() {
        let cat = read(concat!(
            "RAJ2000,DEJ2000,Photometric_Redshift,Spectroscopic_Redshift\n",
            "400.0,-27.0,abc,-1.5\n",
        ));
        assert_eq!(cat.rows.len(), 1);
        assert_eq!(cat.row_errors.len(), 3);
        assert!(cat.row_errors.iter().all(|e| e.line == 2));
        assert_eq!(cat.rows[0].dec, Some(-27.0));
        assert_eq!(cat.rows[0].ra, None);
    }

    #[test]
    fn missing_value_tokens_read_as_empty_cells() {
        let cat = read(concat!(
            "Seq,RAJ2000,DEJ2000,Photometric_Redshift,Spectroscopic_Redshift\n",
            "1,53.16,-27.79,NaN,1.18\n",
            "2,53.17,-27.80,0.55,nan\n",
            "3,NA,N/A,null,NULL\n",
            "4,53.18,-27.81, n/a ,0.90\n",
        ));
        assert_eq!(cat.rows_read, 4);
        assert!(cat.row_errors.is_empty());
        assert_eq!(cat.with_redshifts(), 0);
        assert_eq!(cat.with_positions(), 3);
        assert_eq!(cat.rows[0].z_phot, None);
        assert_eq!(cat.rows[0].z_spec, Some(1.18));
        assert_eq!(cat.rows[2].position(), None);
        assert_eq!(cat.rows[3].z_spec, Some(0.90));
    }

    #[test]
    fn missing_both_column_pairs_is_an_error() {
        let err = read_catalog("a,b\n1,2\n".as_bytes(), &CatalogConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        let mut bytes = b"Name,RAJ2000,DEJ2000\n".to_vec();
        bytes.extend_from_slice(b"G\xe9o,1.0,2.0\n");
        let cat = read_catalog(bytes.as_slice(), &CatalogConfig::default()).unwrap();
        assert_eq!(cat.rows[0].id.as_deref(), Some("Géo"));
    }

    #[test]
    fn sexagesimal_coordinates_parse() {
        let ra = parse_ra("03 32 39.0").unwrap();
        assert!((ra - (3.0 + 32.0 / 60.0 + 39.0 / 3600.0) * 15.0).abs() < 1e-9);
        let dec = parse_dec("-27:47:29.1").unwrap();
        assert!((dec + (27.0 + 47.0 / 60.0 + 29.1 / 3600.0)).abs() < 1e-9);
        let small = parse_dec("-00 30 00").unwrap();
        assert!((small + 0.5).abs() < 1e-12);
        assert_eq!(parse_dec("12 75 00"), None);
        assert_eq!(parse_ra("53.16"), Some(53.16));
    }
}
