use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::models::{ListQuery, Paste, UpdatePaste};

pub const PASTE_ID_LEN: usize = 24;

/// Document-store operations the paste handlers rely on.
///
/// Implementations must be safe to share across request tasks.
pub trait PasteStore: Send + Sync {
    fn insert(&self, paste: Paste) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Paste, StoreError>;

    /// Count one read of the paste and return it including that read. A
    /// paste whose read limit is reached by this read is removed.
    fn record_read(&self, id: &str) -> Result<Paste, StoreError>;

    fn update(&self, id: &str, update: UpdatePaste) -> Result<Paste, StoreError>;

    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// One page of pastes, filtered by creation window and sorted by
    /// creation time.
    fn list(&self, query: &ListQuery, page_size: usize) -> Result<Vec<Paste>, StoreError>;
}

// Paste id: first 24 hex digits of a hash over the paste and its creation
pub fn make_paste_id(title: &str, content: &str, created_at: DateTime<Utc>, seq: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title);
    hasher.update(content);
    hasher.update(created_at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hasher.update(seq.to_be_bytes());
    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(PASTE_ID_LEN);
    id
}

static PASTE_SEQ: AtomicU64 = AtomicU64::new(0);

// Build a new paste with a fresh id
pub fn new_paste(title: String, content: String, delete_after: u32) -> Paste {
    let created_at = Utc::now();
    let seq = PASTE_SEQ.fetch_add(1, Ordering::Relaxed);
    Paste {
        id: make_paste_id(&title, &content, created_at, seq),
        title,
        content,
        created_at,
        delete_after,
        current_reads: 0,
    }
}

pub fn is_valid_paste_id(id: &str) -> bool {
    id.len() == PASTE_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

// In-memory store keyed by paste id
#[derive(Debug, Default)]
pub struct MemoryStore {
    pastes: DashMap<String, Paste>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasteStore for MemoryStore {
    fn insert(&self, paste: Paste) -> Result<(), StoreError> {
        self.pastes.insert(paste.id.clone(), paste);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Paste, StoreError> {
        self.pastes
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn record_read(&self, id: &str) -> Result<Paste, StoreError> {
        // count, limit check and removal share one shard lock
        match self.pastes.entry(id.to_owned()) {
            Entry::Occupied(mut entry) => {
                let paste = entry.get_mut();
                paste.current_reads = paste.current_reads.saturating_add(1);
                let exhausted = paste.delete_after > 0 && paste.current_reads >= paste.delete_after;

                if exhausted {
                    Ok(entry.remove())
                } else {
                    Ok(entry.get().clone())
                }
            }
            Entry::Vacant(_) => Err(StoreError::NotFound(id.to_string())),
        }
    }

    fn update(&self, id: &str, update: UpdatePaste) -> Result<Paste, StoreError> {
        let mut entry = self
            .pastes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.title = update.title;
        entry.content = update.content;
        Ok(entry.clone())
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.pastes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self, query: &ListQuery, page_size: usize) -> Result<Vec<Paste>, StoreError> {
        let since = query.filter.since(Utc::now());

        let mut pastes: Vec<Paste> = self
            .pastes
            .iter()
            .filter(|entry| since.is_none_or(|since| entry.created_at >= since))
            .map(|entry| entry.value().clone())
            .collect();

        pastes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if query.newest_first() {
            pastes.reverse();
        }

        let skip = (query.page() - 1).saturating_mul(page_size);
        Ok(pastes.into_iter().skip(skip).take(page_size).collect())
    }
}
