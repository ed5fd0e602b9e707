//! Tab-separated broker query results

use crate::error::{IngestError, Result};
use std::collections::HashMap;

/// Default column separator of broker query results
pub const DEFAULT_SEPARATOR: char = '\t';

/// One result row keyed by column name
pub type TabularRow = HashMap<String, String>;

/// Parse a broker query result.
///
/// The first non-blank line is the header; `?` is removed from the column
/// names. Every later non-blank line becomes one row with trimmed values.
/// Values beyond the header's width are dropped; a row with fewer values
/// than columns is rejected.
pub fn parse_tabular_response(raw: &str, separator: char) -> Result<Vec<TabularRow>> {
    let mut lines = raw.split('\n').map(str::trim).filter(|l| !l.is_empty());

    let columns: Vec<String> = match lines.next() {
        Some(header) => header.split(separator).map(|c| c.replace('?', "")).collect(),
        None => return Ok(Vec::new()),
    };

    lines
        .enumerate()
        .map(|(index, line)| {
            let values: Vec<&str> = line.split(separator).collect();
            if values.len() < columns.len() {
                return Err(IngestError::parse(format!(
                    "row {} has {} values but the header has {} columns",
                    index + 1,
                    values.len(),
                    columns.len()
                )));
            }

            Ok(columns
                .iter()
                .zip(values)
                .map(|(column, value)| (column.clone(), value.trim().to_string()))
                .collect())
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> TabularRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let rows = parse_tabular_response("?a\tb\n\n1\t2\n\n3\t4", DEFAULT_SEPARATOR).unwrap();
        assert_eq!(rows, vec![row(&[("a", "1"), ("b", "2")]), row(&[("a", "3"), ("b", "4")])]);
    }

    #[test]
    fn test_leading_blank_lines_do_not_count_as_header() {
        let rows = parse_tabular_response("\n  \n?x\n1\n", DEFAULT_SEPARATOR).unwrap();
        assert_eq!(rows, vec![row(&[("x", "1")])]);
    }

    #[test]
    fn test_n_rows_for_n_plus_one_lines() {
        let raw = "?resultUri\t?type\t?externalname\n\
                   <https://c/1>\t<https://t/D>\t<https://p:8080/api/offers/1>\n\
                   <https://c/2>\t<https://t/D>\t<https://p:8080/api/offers/2>\n\
                   <https://c/3>\t<https://t/S>\t<https://p:8080/api/offers/3>";
        let rows = parse_tabular_response(raw, DEFAULT_SEPARATOR).unwrap();

        assert_eq!(rows.len(), 3);
        for r in &rows {
            let mut keys: Vec<_> = r.keys().map(String::as_str).collect();
            keys.sort_unstable();
            assert_eq!(keys, ["externalname", "resultUri", "type"]);
        }
        assert_eq!(rows[2]["externalname"], "<https://p:8080/api/offers/3>");
    }

    #[test]
    fn test_values_are_trimmed_and_extras_dropped() {
        let rows = parse_tabular_response("?a\t?b\n 1 \t 2 \t3\r\n", DEFAULT_SEPARATOR).unwrap();
        assert_eq!(rows, vec![row(&[("a", "1"), ("b", "2")])]);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let err = parse_tabular_response("?a\t?b\n1\n", DEFAULT_SEPARATOR).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tabular_response("\n\n", DEFAULT_SEPARATOR).unwrap().is_empty());
    }

    #[test]
    fn test_custom_separator() {
        let rows = parse_tabular_response("?a,?b\nx,y", ',').unwrap();
        assert_eq!(rows, vec![row(&[("a", "x"), ("b", "y")])]);
    }
}
