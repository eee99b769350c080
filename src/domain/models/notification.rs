use serde::{Deserialize, Serialize};

/// One uploaded object, as announced by the upload trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub bucket: String,
    pub key: String,
}

impl NotificationRecord {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}
