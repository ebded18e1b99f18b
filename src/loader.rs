use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::PeekError;
use crate::parser::parse;
use crate::table::Table;

pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    CSV,
    TXT,
}

/// Where the raw text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File { path: PathBuf, file_size: u64 },
}

impl Source {
    pub fn name(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".to_string(),
            Source::File { path, .. } => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string(),
        }
    }

    /// Name plus the on-disk size, used as the viewer title.
    pub fn describe(&self) -> String {
        match self {
            Source::Stdin => self.name(),
            Source::File { file_size, .. } => {
                format!("{} ({})", self.name(), human_size(*file_size))
            }
        }
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

/// Expand `~` and `$VAR` in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, PeekError> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| PeekError::loading(format!("cannot expand \"{raw}\": {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Read and parse `raw_path`, `-` reads stdin.
#[instrument]
pub fn load(raw_path: &str) -> Result<(Source, Table), PeekError> {
    let (source, text) = if raw_path == STDIN_PATH {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        (Source::Stdin, String::from_utf8(bytes)?)
    } else {
        let path = expand_path(raw_path)?;
        let source = file_source(&path)?;
        let text = String::from_utf8(fs::read(&path)?)?;
        (source, text)
    };
    debug!("Read {} bytes from {}", text.len(), source.name());

    let table = parse(&text);
    info!(
        "Loaded {} with {} columns and {} rows",
        source.name(),
        table.ncolumns(),
        table.total_row_count
    );
    Ok((source, table))
}

fn file_source(path: &Path) -> Result<Source, PeekError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PeekError::FileNotFound,
        ErrorKind::PermissionDenied => PeekError::PermissionDenied,
        _ => PeekError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(PeekError::loading(format!(
            "{} is not a file",
            path.display()
        )));
    }
    let file_type = detect_file_type(path)?;
    debug!("Detected {:?} for {}", file_type, path.display());

    Ok(Source::File {
        path: path.to_path_buf(),
        file_size: metadata.len(),
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, PeekError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("TXT") => Ok(FileType::TXT),
        _ => Err(PeekError::UnknownFileType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn loads_fixture() {
        let (source, table) = load(&fixture("employees.csv")).unwrap();
        assert_eq!(source.name(), "employees.csv");
        assert_eq!(source.describe(), "employees.csv (132 B)");
        assert_eq!(table.headers, vec!["姓名", "年齡", "部門"]);
        assert_eq!(table.total_row_count, 5);
    }

    #[test]
    fn missing_file() {
        let err = load(&fixture("does_not_exist.csv")).unwrap_err();
        assert!(matches!(err, PeekError::FileNotFound));
    }

    #[test]
    fn directory_is_rejected() {
        let err = load(&fixture("")).unwrap_err();
        assert!(matches!(err, PeekError::LoadingFailed(..)));
    }

    #[test]
    fn unknown_extension() {
        let path = format!("{}/Cargo.toml", env!("CARGO_MANIFEST_DIR"));
        let err = load(&path).unwrap_err();
        assert!(matches!(err, PeekError::UnknownFileType));
    }

    #[test]
    fn sizes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(Source::Stdin.describe(), "<stdin>");
    }

    #[test]
    fn file_types() {
        assert_eq!(detect_file_type(Path::new("a.CSV")).unwrap(), FileType::CSV);
        assert_eq!(detect_file_type(Path::new("a.txt")).unwrap(), FileType::TXT);
        assert!(detect_file_type(Path::new("a")).is_err());
    }

    #[test]
    fn expands_variables() {
        let expanded = expand_path("$CARGO_MANIFEST_DIR/data.csv").unwrap();
        assert_eq!(
            expanded,
            PathBuf::from(format!("{}/data.csv", env!("CARGO_MANIFEST_DIR")))
        );
        assert_eq!(expand_path("plain.csv").unwrap(), PathBuf::from("plain.csv"));
        assert!(expand_path("$CSVPEEK_UNSET_TEST_VARIABLE/a.csv").is_err());
    }
}
