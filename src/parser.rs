use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::table::Table;

const BOM: char = '\u{feff}';

/// Parse comma separated text into a [`Table`].
///
/// The first non blank line holds the headers. Blank lines are skipped
/// anywhere in the input. Rows shorter than the header are padded with empty
/// cells, longer rows keep their extra cells.
pub fn parse(text: &str) -> Table {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if text.trim().is_empty() {
        return Table::empty();
    }

    let start_time = Instant::now();
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Table::empty();
    };
    let headers = parse_line(header_line);
    let ncolumns = headers.len();

    let data_lines: Vec<&str> = lines.collect();
    let rows: Vec<Vec<String>> = data_lines
        .par_iter()
        .enumerate()
        .map(|(idx, line)| {
            let mut row = parse_line(line);
            if row.len() < ncolumns {
                warn!(
                    "Row {} has {} cells, padding to {} columns",
                    idx + 1,
                    row.len(),
                    ncolumns
                );
                row.resize(ncolumns, String::new());
            } else if row.len() > ncolumns {
                warn!(
                    "Row {} has {} cells but only {} headers, keeping extra cells",
                    idx + 1,
                    row.len(),
                    ncolumns
                );
            }
            row
        })
        .collect();

    debug!(
        "Parsed {} columns and {} rows in {}ms",
        ncolumns,
        rows.len(),
        start_time.elapsed().as_millis()
    );
    Table::new(headers, rows)
}

/// Split a single record into trimmed fields.
///
/// `""` inside a quoted section is a literal quote. An unbalanced quote keeps
/// the rest of the line quoted.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        trace!("Unbalanced quote in line: {}", line);
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert_eq!(parse(""), Table::empty());
        assert_eq!(parse("   \n  \n"), Table::empty());
        assert_eq!(parse("\u{feff}"), Table::empty());
        assert_eq!(parse("\r\n\r\n"), Table::empty());
    }

    #[test]
    fn header_only() {
        let table = parse("a,b,c\n");
        assert_eq!(table.headers, row(&["a", "b", "c"]));
        assert!(table.rows.is_empty());
        assert_eq!(table.total_row_count, 0);
    }

    #[test]
    fn shape_matches_input() {
        let table = parse("name,age,dept\nA,1,x\nB,2,y\nC,3,z\n");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.total_row_count, 3);
        assert!(table.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn bom_is_stripped() {
        let text = "名稱,數量\n產品A,3\n";
        let with_bom = format!("\u{feff}{text}");
        assert_eq!(parse(text), parse(&with_bom));
        assert_eq!(parse(&with_bom).headers[0], "名稱");
    }

    #[test]
    fn crlf_and_blank_lines() {
        let table = parse("a,b\r\n\r\n1,2\r\n   \r\n3,4\r\n");
        assert_eq!(table.headers, row(&["a", "b"]));
        assert_eq!(table.rows, vec![row(&["1", "2"]), row(&["3", "4"])]);
    }

    #[test]
    fn escaped_quotes_collapse() {
        let table = parse("名稱,描述\n產品A,\"這是一個\"\"特殊\"\"產品\"");
        assert_eq!(table.rows[0][1], "這是一個\"特殊\"產品");
    }

    #[test]
    fn quoted_delimiter_stays_in_cell() {
        let table = parse("名稱,描述\n產品B,\"包含,逗號,的描述\"");
        assert_eq!(table.rows[0], row(&["產品B", "包含,逗號,的描述"]));
    }

    #[test]
    fn fields_are_trimmed() {
        assert_eq!(parse_line("  a ,b  ,  c"), row(&["a", "b", "c"]));
        assert_eq!(parse_line("\" padded \",x"), row(&["padded", "x"]));
    }

    #[test]
    fn empty_fields_are_kept() {
        assert_eq!(parse_line(",,"), row(&["", "", ""]));
        assert_eq!(parse_line("a,"), row(&["a", ""]));
    }

    #[test]
    fn unbalanced_quote_swallows_rest_of_line() {
        assert_eq!(parse_line("a,\"b,c"), row(&["a", "b,c"]));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse("a,b,c\n1\n1,2\n");
        assert_eq!(table.rows, vec![row(&["1", "", ""]), row(&["1", "2", ""])]);
    }

    #[test]
    fn long_rows_are_not_truncated() {
        let table = parse("a,b\n1,2,3\n");
        assert_eq!(table.rows[0], row(&["1", "2", "3"]));
        assert_eq!(table.headers.len(), 2);
    }
}
