use derive_setters::Setters;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::trace;

use crate::table::{SortDirection, Table};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Keep the rows where any cell contains `term`, ignoring case.
///
/// A blank term returns the table as is, including its total row count.
pub fn search(table: &Table, term: &str) -> Table {
    if term.trim().is_empty() {
        return table.clone();
    }
    let start_time = Instant::now();
    let needle = term.to_lowercase();

    let rows: Vec<Vec<String>> = table
        .rows
        .par_iter()
        .filter(|row| row.iter().any(|cell| cell.to_lowercase().contains(&needle)))
        .cloned()
        .collect();

    trace!(
        "Search for \"{}\" found {} matching rows in {}ms",
        term,
        rows.len(),
        start_time.elapsed().as_millis()
    );
    let total = rows.len();
    table.with_rows(rows, total)
}

/// Stable sort of the rows by the cells in `column`.
///
/// A column outside the headers leaves the table untouched.
pub fn sort(table: &Table, column: usize, direction: SortDirection) -> Table {
    if column >= table.ncolumns() {
        trace!(
            "Sort column {} out of range ({} columns), skipping",
            column,
            table.ncolumns()
        );
        return table.clone();
    }

    // Parse every cell once instead of on every comparison.
    let mut keyed: Vec<(SortKey, &Vec<String>)> = table
        .rows
        .iter()
        .map(|row| {
            let cell = row.get(column).map(String::as_str).unwrap_or("");
            (SortKey::from_cell(cell), row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match direction {
        SortDirection::Ascending => a.cmp(b),
        SortDirection::Descending => b.cmp(a),
    });

    let rows = keyed.into_iter().map(|(_, row)| row.clone()).collect();
    table.with_rows(rows, table.total_row_count)
}

/// Rows of the 1-based `page`. The total row count is carried over from the
/// input so the caller still sees the size of the whole set.
pub fn paginate(table: &Table, page: usize, page_size: usize) -> Table {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let rows = table
        .rows
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();
    table.with_rows(rows, table.total_row_count)
}

/// Cell value as seen by the sort comparator.
///
/// Blank cells order first, then numbers numerically, then text. Text
/// compares without case first and falls back to the exact code points, so
/// the order is total.
#[derive(Debug)]
enum SortKey<'a> {
    Empty(&'a str),
    Number(f64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn from_cell(cell: &'a str) -> Self {
        if cell.trim().is_empty() {
            return SortKey::Empty(cell);
        }
        match parse_number(cell) {
            Some(n) => SortKey::Number(n),
            None => SortKey::Text(cell),
        }
    }
}

impl PartialEq for SortKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey<'_> {}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Empty(a), SortKey::Empty(b)) => a.cmp(b),
            (SortKey::Empty(_), _) => Ordering::Less,
            (_, SortKey::Empty(_)) => Ordering::Greater,
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => collate(a, b),
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Everything the caller controls about the rendered view.
///
/// Changing what is in the result set sends the view back to page 1, moving
/// between pages does not.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
#[setters(prefix = "with_")]
pub struct PipelineParams {
    #[setters(into)]
    pub search_term: String,
    pub sort_column: Option<usize>,
    pub sort_direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort_column: None,
            sort_direction: SortDirection::Ascending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PipelineParams {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, column: usize, direction: SortDirection) {
        self.sort_column = Some(column);
        self.sort_direction = direction;
        self.page = 1;
    }

    /// Same column flips the direction, a new column starts ascending.
    pub fn toggle_sort(&mut self, column: usize) {
        let direction = match self.sort_column {
            Some(current) if current == column => self.sort_direction.reversed(),
            _ => SortDirection::Ascending,
        };
        self.set_sort(column, direction);
    }

    pub fn clear_sort(&mut self) {
        self.sort_column = None;
        self.sort_direction = SortDirection::Ascending;
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.set_page(self.page + 1, total_pages);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn first_page(&mut self) {
        self.page = 1;
    }

    pub fn last_page(&mut self, total_pages: usize) {
        self.set_page(total_pages, total_pages);
    }
}

/// One page of the pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineView {
    /// Rows of the current page; `total_row_count` is the filtered count.
    pub table: Table,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl PipelineView {
    pub fn filtered_row_count(&self) -> usize {
        self.table.total_row_count
    }

    /// 1-based, inclusive row numbers shown on this page, if any.
    pub fn row_range(&self) -> Option<(usize, usize)> {
        if self.table.rows.is_empty() {
            return None;
        }
        let first = (self.page - 1) * self.page_size + 1;
        Some((first, first + self.table.rows.len() - 1))
    }
}

/// Search, then sort, then paginate.
pub fn run(table: &Table, params: &PipelineParams) -> PipelineView {
    let start_time = Instant::now();
    let page_size = params.page_size.max(1);
    let page = params.page.max(1);

    let filtered = search(table, &params.search_term);
    let sorted = match params.sort_column {
        Some(column) => sort(&filtered, column, params.sort_direction),
        None => filtered,
    };
    let total_pages = sorted.total_row_count.div_ceil(page_size);
    let paged = paginate(&sorted, page, page_size);

    trace!(
        "Pipeline run: search \"{}\", sort {:?} {}, page {}/{}, {} of {} rows in {}ms",
        params.search_term,
        params.sort_column,
        params.sort_direction,
        page,
        total_pages,
        paged.total_row_count,
        table.total_row_count,
        start_time.elapsed().as_millis()
    );

    PipelineView {
        table: paged,
        page,
        page_size,
        total_pages,
    }
}
