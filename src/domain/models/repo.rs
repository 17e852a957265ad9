use serde::{Deserialize, Serialize};

/// An indexed repository root. One store serves many of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: i64,
    pub root_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Current wall-clock time as Unix epoch seconds.
pub fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
