use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid stored value for {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}
