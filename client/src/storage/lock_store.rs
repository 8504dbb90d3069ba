//! Attachment locks
//!
//! Once the author attaches a file (or link) to a task, material or
//! announcement, further attachments of that kind are refused. The
//! service reports this too, but only after its next listing; the local
//! lock is recorded right after the attach succeeds so the action never
//! reappears in between.
//!
//! Locks are written through to SQLite and mirrored in memory so lookups
//! are synchronous. Each (user, class) pair sees only its own locks.

use crate::database::{LockRecord, Repository};
use crate::error::Result;
use crate::models::AttachmentKind;
use crate::remote::AttachmentOwner;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// What is locked: one attachment family on one owner type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockKind {
    pub owner: AttachmentOwner,
    pub attachment: AttachmentKind,
}

impl LockKind {
    pub fn new(owner: AttachmentOwner, attachment: AttachmentKind) -> Self {
        Self { owner, attachment }
    }

    /// Stable storage key, e.g. "announcement_link"
    pub fn key(&self) -> &'static str {
        match (self.owner, self.attachment) {
            (AttachmentOwner::Task, AttachmentKind::File) => "task_file",
            (AttachmentOwner::Task, AttachmentKind::Link) => "task_link",
            (AttachmentOwner::Material, AttachmentKind::File) => "material_file",
            (AttachmentOwner::Material, AttachmentKind::Link) => "material_link",
            (AttachmentOwner::Announcement, AttachmentKind::File) => "announcement_file",
            (AttachmentOwner::Announcement, AttachmentKind::Link) => "announcement_link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LockKey {
    user_id: String,
    class_id: String,
    kind: String,
    entity_id: String,
}

impl From<LockRecord> for LockKey {
    fn from(record: LockRecord) -> Self {
        Self {
            user_id: record.user_id,
            class_id: record.class_id,
            kind: record.lock_kind,
            entity_id: record.entity_id,
        }
    }
}

impl From<&LockKey> for LockRecord {
    fn from(key: &LockKey) -> Self {
        LockRecord {
            user_id: key.user_id.clone(),
            class_id: key.class_id.clone(),
            lock_kind: key.kind.clone(),
            entity_id: key.entity_id.clone(),
        }
    }
}

struct Inner {
    repo: Repository,
    locks: RwLock<HashSet<LockKey>>,
}

/// Durable store of every user's attachment locks
#[derive(Clone)]
pub struct LockStore {
    inner: Arc<Inner>,
}

impl LockStore {
    /// Load the persisted locks
    pub async fn open(repo: Repository) -> Result<Self> {
        let locks: HashSet<LockKey> = repo
            .list_locks()
            .await?
            .into_iter()
            .map(LockKey::from)
            .collect();

        tracing::debug!("Loaded {} attachment locks", locks.len());

        Ok(Self {
            inner: Arc::new(Inner {
                repo,
                locks: RwLock::new(locks),
            }),
        })
    }

    /// The locks of one viewer within one class
    pub fn scope(&self, user_id: &str, class_id: &str) -> ClassLocks {
        ClassLocks {
            store: self.clone(),
            user_id: user_id.to_string(),
            class_id: class_id.to_string(),
        }
    }

    /// Forget every lock of `user_id` (logout)
    pub async fn clear_user(&self, user_id: &str) -> Result<()> {
        self.inner.repo.clear_locks_for_user(user_id).await?;
        self.inner.locks.write().retain(|key| key.user_id != user_id);
        tracing::info!("Cleared attachment locks for user {}", user_id);
        Ok(())
    }
}

/// Lock view scoped to one (user, class) pair
#[derive(Clone)]
pub struct ClassLocks {
    store: LockStore,
    user_id: String,
    class_id: String,
}

impl ClassLocks {
    fn key(&self, kind: LockKind, entity_id: &str) -> LockKey {
        LockKey {
            user_id: self.user_id.clone(),
            class_id: self.class_id.clone(),
            kind: kind.key().to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    pub fn is_locked(&self, kind: LockKind, entity_id: &str) -> bool {
        let key = self.key(kind, entity_id);
        self.store.inner.locks.read().contains(&key)
    }

    pub async fn lock(&self, kind: LockKind, entity_id: &str) -> Result<()> {
        let key = self.key(kind, entity_id);
        self.store.inner.repo.insert_lock(&LockRecord::from(&key)).await?;
        self.store.inner.locks.write().insert(key);
        tracing::debug!("Locked {} for {} in class {}", kind.key(), entity_id, self.class_id);
        Ok(())
    }

    pub async fn unlock(&self, kind: LockKind, entity_id: &str) -> Result<()> {
        let key = self.key(kind, entity_id);
        self.store.inner.repo.delete_lock(&LockRecord::from(&key)).await?;
        self.store.inner.locks.write().remove(&key);
        tracing::debug!("Unlocked {} for {} in class {}", kind.key(), entity_id, self.class_id);
        Ok(())
    }
}
