use std::fmt;
use std::str::FromStr;

/// Parsed delimited text: a header row plus data rows of string cells.
///
/// `total_row_count` is the number of rows before pagination. Filtering
/// recomputes it, paginating keeps it, so a page always knows the size of
/// the set it was cut from.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_row_count: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let total_row_count = rows.len();
        Self {
            headers,
            rows,
            total_row_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn ncolumns(&self) -> usize {
        self.headers.len()
    }

    /// Cell at `row`/`column`, missing cells read as the empty string.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub(crate) fn with_rows(&self, rows: Vec<Vec<String>>, total_row_count: usize) -> Self {
        Self {
            headers: self.headers.clone(),
            rows,
            total_row_count,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction \"{other}\", use asc or desc")),
        }
    }
}
