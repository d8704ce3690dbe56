//! In-memory entry repository with explicit post-commit effects.
//!
//! Write paths return the list of effects the caller must run once the
//! store has confirmed the write. Effects are plain descriptors, never
//! mutable state accumulated on the entity, so a bus publish can never
//! precede (or survive a failure of) the commit it describes.

use dashmap::DashMap;
use subject_events::ChangeKind;

use crate::error::{AppError, Result};
use crate::models::{CreateEntryRequest, JournalEntry};

/// Side effect to run only after the store confirms the write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCommitEffect {
    /// Publish a subject change event to the bus
    PublishSubjectChanged {
        subject_id: String,
        kind: ChangeKind,
    },
}

/// In-memory journal entry repository
#[derive(Default)]
pub struct EntryRepo {
    entries: DashMap<String, JournalEntry>,
}

impl EntryRepo {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Create an entry; the effect list must run after this returns.
    pub fn create(&self, req: &CreateEntryRequest) -> Result<(JournalEntry, Vec<PostCommitEffect>)> {
        if req.owner_user_id.is_empty() || req.title.is_empty() {
            return Err(AppError::BadRequest(
                "owner_user_id and title are required".into(),
            ));
        }

        let entry = JournalEntry::from_request(req);
        self.entries.insert(entry.id.clone(), entry.clone());

        let effects = vec![PostCommitEffect::PublishSubjectChanged {
            subject_id: entry.owner_user_id.clone(),
            kind: ChangeKind::Updated,
        }];

        Ok((entry, effects))
    }

    pub fn get(&self, id: &str) -> Result<JournalEntry> {
        self.entries
            .get(id)
            .map(|e| e.clone())
            .ok_or_else(|| AppError::NotFound(format!("entry {}", id)))
    }

    /// Delete an entry. Idempotent: deleting an absent id succeeds with no
    /// effects, so a retried compensation never fails spuriously.
    pub fn delete(&self, id: &str) -> Vec<PostCommitEffect> {
        match self.entries.remove(id) {
            Some((_, entry)) => vec![PostCommitEffect::PublishSubjectChanged {
                subject_id: entry.owner_user_id,
                kind: ChangeKind::Updated,
            }],
            None => Vec::new(),
        }
    }

    /// All entries owned by a user, newest first
    pub fn list_by_owner(&self, owner_user_id: &str) -> Vec<JournalEntry> {
        let mut entries: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|e| e.owner_user_id == owner_user_id)
            .map(|e| e.clone())
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner: &str, title: &str) -> CreateEntryRequest {
        CreateEntryRequest {
            owner_user_id: owner.to_string(),
            title: title.to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn create_returns_publish_effect() {
        let repo = EntryRepo::new();
        let (entry, effects) = repo.create(&request("user-1", "first")).unwrap();

        assert_eq!(
            effects,
            vec![PostCommitEffect::PublishSubjectChanged {
                subject_id: "user-1".to_string(),
                kind: ChangeKind::Updated,
            }]
        );
        assert_eq!(repo.get(&entry.id).unwrap().title, "first");
    }

    #[test]
    fn delete_is_idempotent() {
        let repo = EntryRepo::new();
        let (entry, _) = repo.create(&request("user-1", "first")).unwrap();

        let effects = repo.delete(&entry.id);
        assert_eq!(effects.len(), 1);

        // Second delete: no entry, no effects, no error.
        let effects = repo.delete(&entry.id);
        assert!(effects.is_empty());
    }

    #[test]
    fn list_by_owner_filters() {
        let repo = EntryRepo::new();
        repo.create(&request("user-1", "a")).unwrap();
        repo.create(&request("user-1", "b")).unwrap();
        repo.create(&request("user-2", "c")).unwrap();

        assert_eq!(repo.list_by_owner("user-1").len(), 2);
        assert_eq!(repo.list_by_owner("user-2").len(), 1);
        assert!(repo.list_by_owner("user-3").is_empty());
    }

    #[test]
    fn create_validates_required_fields() {
        let repo = EntryRepo::new();
        assert!(repo.create(&request("", "title")).is_err());
        assert!(repo.create(&request("user-1", "")).is_err());
    }
}
