/// Data model for link documents
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single link between an owning aggregate and a linked target.
///
/// All documents with the same `owner_id` are colocated in one partition;
/// atomic multi-document operations are only possible within that partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkDocument {
    pub id: String,
    pub owner_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}

impl LinkDocument {
    pub fn new(owner_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            target_id: target_id.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_document() {
        let doc = LinkDocument::new("J1", "T1");
        assert_eq!(doc.owner_id, "J1");
        assert_eq!(doc.target_id, "T1");
        assert!(!doc.id.is_empty());
    }

    #[test]
    fn test_serialization_round_trip() {
        let doc = LinkDocument::new("J1", "T1");
        let json = serde_json::to_string(&doc).unwrap();
        let decoded: LinkDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, decoded);
    }
}
