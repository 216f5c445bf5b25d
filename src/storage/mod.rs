mod client;
mod errors;
mod models;

pub use client::StorageClient;
pub use errors::StorageError;
pub use models::StoredStreamConfig;
