use crate::search_query::QuerySyntaxError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("bookmark {0} not found")]
    NotFound(u64),

    #[error("bookmark with this url already exists at id {0}")]
    AlreadyExists(u64),

    #[error("invalid search query: {0}")]
    Query(#[from] QuerySyntaxError),

    #[error("malformed bookmark record: {0}")]
    Malformed(String),

    #[error("invalid timestamp: {0}")]
    Time(#[from] chrono::ParseError),

    #[error("csv error: {0:?}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
