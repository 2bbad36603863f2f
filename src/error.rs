use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoocError>;

// every fatal condition of the pipeline gets its own variant so the
// driver can print it and callers can match on it
#[derive(Error, Debug)]
pub enum CoocError {
    #[error("cannot open {path}: {source}")]
    File { path: String, source: std::io::Error },

    #[error("config error: {0}")]
    Config(String),

    #[error("bad vocab line {line}: {text:?}")]
    BadVocabLine { line: usize, text: String },

    #[error("item {0:?} interned twice")]
    DuplicateItem(String),

    #[error("main id {id} out of range (table size {size})")]
    MainIdOutOfRange { id: i64, size: usize },

    #[error("entry {id} ({item:?}) has zero count, cannot weight a partner")]
    ZeroCount { id: u32, item: String },

    #[error("line {line}: malformed count field in main entry {token:?}")]
    BadMainEntry { line: usize, token: String },

    #[error("partner id {id} out of table bounds (size {size})")]
    BadPartnerRef { id: u32, size: usize },

    #[error("entry at index {index} holds id {id}, table is inconsistent")]
    IdentityMismatch { index: usize, id: u32 },

    #[error("unresolved partner reference in entry {id}")]
    Unresolved { id: u32 },

    #[error("truncated co-occurrence record ({got} of {want} bytes)")]
    TruncatedRecord { got: usize, want: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),
}

impl CoocError {
    pub fn config(msg: impl Into<String>) -> Self {
        CoocError::Config(msg.into())
    }
}
