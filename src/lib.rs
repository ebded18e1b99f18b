//! Preview delimited text: parse it into a [`Table`], then search, sort and
//! paginate it with [`pipeline::run`].
//!
//! ```
//! use csvpeek::{PipelineParams, SortDirection, parse, run};
//!
//! let table = parse("name,age\nann,30\nbob,4\n");
//! let params = PipelineParams::new(1).with_sort_column(Some(1));
//! let view = run(&table, &params);
//! assert_eq!(view.table.rows[0], vec!["bob", "4"]);
//! assert_eq!(view.total_pages, 2);
//! assert_eq!(params.sort_direction, SortDirection::Ascending);
//! ```

pub mod controller;
pub mod domain;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod table;
pub mod ui;

pub use domain::{PeekConfig, PeekError};
pub use parser::parse;
pub use pipeline::{PipelineParams, PipelineView, paginate, run, search, sort};
pub use table::{SortDirection, Table};
