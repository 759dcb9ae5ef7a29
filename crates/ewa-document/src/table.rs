//! Pipe-table parser.
//!
//! `| A | B |` and `A | B` both yield `["A", "B"]`: one outer pipe on each
//! side is a delimiter, not an empty cell. Inner empty cells are kept.
use crate::error::TableError;
use crate::model::ParsedTable;

/// Split one table line into trimmed cells.
pub fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Parse the lines of a table block: header, `---` separator, then data rows.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Result<ParsedTable, TableError> {
    if lines.len() < 2 {
        return Err(TableError::TooShort { lines: lines.len() });
    }

    let separator = lines[1].as_ref();
    if !separator.contains("---") {
        return Err(TableError::MissingSeparator {
            line: separator.to_string(),
        });
    }

    let headers = split_cells(lines[0].as_ref());
    let rows = lines[2..]
        .iter()
        .map(S::as_ref)
        .filter(|line| !line.trim().is_empty())
        .map(split_cells)
        .collect();

    Ok(ParsedTable { headers, rows })
}

impl ParsedTable {
    /// Cell text at `(row, column)`; missing cells read as the empty string.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Index of the first header equal to `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Widest of the header row and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn outer_pipes_are_delimiters() {
        assert_eq!(split_cells("| A | B |"), vec!["A", "B"]);
        assert_eq!(split_cells("A | B"), vec!["A", "B"]);
        assert_eq!(split_cells("  | A |B|  "), vec!["A", "B"]);
    }

    #[test]
    fn inner_empty_cells_survive() {
        assert_eq!(split_cells("| A |  | C |"), vec!["A", "", "C"]);
        assert_eq!(split_cells("|  | B |"), vec!["", "B"]);
    }

    #[test]
    fn parses_health_table() {
        let table = parse_table(&["| Area | Status |", "| --- | --- |", "| DB | Good |"])
            .expect("valid table");
        assert_eq!(table.headers, vec!["Area", "Status"]);
        assert_eq!(table.rows, vec![vec!["DB", "Good"]]);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = parse_table(&["| A | B | C |", "|---|---|---|", "| 1 |"]).expect("valid table");
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.cell(0, 0), "1");
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(5, 0), "");
        assert_eq!(table.width(), 3);
        assert_eq!(table.column("B"), Some(1));
        assert_eq!(table.column("Z"), None);
    }

    #[test]
    fn blank_data_lines_are_skipped() {
        let table = parse_table(&["| A |", "| --- |", "  ", "| 1 |"]).expect("valid table");
        assert_eq!(table.rows, vec![vec!["1"]]);
    }

    #[test]
    fn header_only_table_is_valid() {
        let table = parse_table(&["| A |", "| --- |"]).expect("valid table");
        assert!(table.rows.is_empty());
    }

    #[test]
    fn rejects_single_line() {
        assert!(matches!(
            parse_table(&["| A |"]),
            Err(TableError::TooShort { lines: 1 })
        ));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(matches!(
            parse_table(&["| A |", "| B |", "| --- |"]),
            Err(TableError::MissingSeparator { .. })
        ));
    }

    fn cell() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 .%]{0,10}[A-Za-z0-9]|[A-Za-z0-9]"
    }

    proptest! {
        /// Property: a table rendered from headers and rows parses back to the same cells
        #[test]
        fn round_trip(
            (headers, rows) in (1usize..6).prop_flat_map(|m| (
                prop::collection::vec(cell(), m),
                prop::collection::vec(prop::collection::vec(cell(), m), 1..8),
            ))
        ) {
            let render = |cells: &[String]| format!("| {} |", cells.join(" | "));
            let mut lines = vec![render(headers.as_slice())];
            lines.push(format!("|{}|", vec!["---"; headers.len()].join("|")));
            lines.extend(rows.iter().map(|r| render(r.as_slice())));

            let table = parse_table(&lines).expect("valid table");
            prop_assert_eq!(table.headers, headers);
            prop_assert_eq!(table.rows, rows);
        }

        /// Property: splitting never panics on arbitrary input
        #[test]
        fn split_never_panics(line in ".*") {
            let _ = split_cells(&line);
        }
    }
}
