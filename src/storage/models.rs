use chrono::{DateTime, Utc};

use crate::live::StreamConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredStreamConfig {
    pub id: i64,
    pub config: StreamConfig,
    pub saved_at: DateTime<Utc>,
}
