use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use std::fmt;
use std::io::Error;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use tracing_error::SpanTrace;

use crate::pipeline::DEFAULT_PAGE_SIZE;

#[derive(Debug)]
pub enum PeekError {
    IoError(Error),
    InvalidEncoding(FromUtf8Error),
    LoadingFailed(String, SpanTrace),
    Clipboard(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl PeekError {
    /// Loading error that remembers the spans it was raised in.
    pub fn loading(message: impl Into<String>) -> Self {
        PeekError::LoadingFailed(message.into(), SpanTrace::capture())
    }
}

impl fmt::Display for PeekError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeekError::IoError(e) => write!(f, "io error: {e}"),
            PeekError::InvalidEncoding(e) => write!(f, "input is not valid UTF-8: {e}"),
            PeekError::LoadingFailed(msg, trace) => write!(f, "loading failed: {msg}\n{trace}"),
            PeekError::Clipboard(msg) => write!(f, "clipboard error: {msg}"),
            PeekError::FileNotFound => f.write_str("file not found"),
            PeekError::PermissionDenied => f.write_str("permission denied"),
            PeekError::UnknownFileType => f.write_str("unknown file type, expected .csv or .txt"),
        }
    }
}

impl std::error::Error for PeekError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeekError::IoError(e) => Some(e),
            PeekError::InvalidEncoding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for PeekError {
    fn from(err: Error) -> Self {
        PeekError::IoError(err)
    }
}

impl From<FromUtf8Error> for PeekError {
    fn from(err: FromUtf8Error) -> Self {
        PeekError::InvalidEncoding(err)
    }
}

impl From<arboard::Error> for PeekError {
    fn from(err: arboard::Error) -> Self {
        PeekError::Clipboard(err.to_string())
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct PeekConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub page_size: usize,
    #[setters(into)]
    pub log_file: PathBuf,
}

impl Default for PeekConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            page_size: DEFAULT_PAGE_SIZE,
            log_file: PathBuf::from("csvpeek.log"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GrowPage,
    ShrinkPage,
    Search,
    ClearSearch,
    ToggleSort,
    ClearSort,
    CopyCell,
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
q          quit
↑ ↓        select row
← →        select column
n PgDn     next page
p PgUp     previous page
g G        first / last page
+ -        grow / shrink page size
/          search (Enter applies, Esc cancels)
c          clear search
s          sort by column, again to reverse
S          clear sort
y Y        copy cell / row
?          this help
Esc        close";
