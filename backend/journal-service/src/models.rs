/// Data model for journal entries
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A journal entry owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub owner_user_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl JournalEntry {
    pub fn from_request(req: &CreateEntryRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id: req.owner_user_id.clone(),
            title: req.title.clone(),
            body: req.body.clone(),
            created_at: Utc::now(),
        }
    }
}
