use thiserror::Error;

/// A binary key that does not describe six yin/yang lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line {position} is {found:?}, expected '0' or '1'")]
    InvalidLine { position: usize, found: char },
    #[error("binary key has {len} characters, at most 6 allowed")]
    TooLong { len: usize },
}

#[derive(Debug, Error)]
pub enum TableError {
    /// The table as a whole is unusable: wrong entry count, duplicate keys,
    /// or the process-wide table failed to load.
    #[error("hexagram table misconfigured: {0}")]
    Configuration(String),
    /// A single record's binary key could not be parsed.
    #[error("hexagram {number} has invalid binary key {key:?}: {source}")]
    InvalidTableData {
        number: u32,
        key: String,
        #[source]
        source: LineError,
    },
    #[error("failed to read hexagram table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode hexagram table: {0}")]
    Json(#[from] serde_json::Error),
}
