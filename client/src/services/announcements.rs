//! Class announcements
//!
//! Announcements are the one place students author content. The author
//! may attach one batch of files and one batch of links; after that the
//! announcement is locked for that kind.

use super::cache::{CollectionCache, EntityCache};
use super::permissions::{self, LockSignals, Permissions, Subject};
use super::sync::required;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::remote::{AttachmentOwner, RemoteGateway, Removable};
use crate::storage::{ClassLocks, LockKind};
use parking_lot::Mutex;
use std::sync::Arc;

const FILE_LOCK: LockKind = LockKind {
    owner: AttachmentOwner::Announcement,
    attachment: AttachmentKind::File,
};
const LINK_LOCK: LockKind = LockKind {
    owner: AttachmentOwner::Announcement,
    attachment: AttachmentKind::Link,
};

pub struct AnnouncementBoard {
    gateway: RemoteGateway,
    viewer_id: String,
    class_id: String,
    role: ClassRole,
    locks: ClassLocks,
    last_error: Mutex<Option<String>>,
    announcements: CollectionCache<String, Announcement>,
    files: CollectionCache<String, FileAttachment>,
}

impl AnnouncementBoard {
    pub fn new(
        gateway: RemoteGateway,
        session: &Session,
        class_id: &str,
        role: ClassRole,
        locks: ClassLocks,
    ) -> Self {
        Self {
            gateway,
            viewer_id: session.user_id.clone(),
            class_id: class_id.to_string(),
            role,
            locks,
            last_error: Mutex::new(None),
            announcements: EntityCache::new(),
            files: EntityCache::new(),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!("Announcements of class {}: {}", self.class_id, e);
            *self.last_error.lock() = Some(e.to_string());
        }
        result
    }

    async fn fetch_announcements(&self) -> Result<Arc<Vec<Announcement>>> {
        let gateway = &self.gateway;
        let class_id = self.class_id.as_str();
        self.announcements
            .ensure_loaded(self.class_id.clone(), move || async move {
                Ok(Arc::new(gateway.list_announcements(class_id).await?))
            })
            .await
    }

    async fn fetch_files(&self, announcement_id: &str) -> Result<Arc<Vec<FileAttachment>>> {
        let gateway = &self.gateway;
        self.files
            .ensure_loaded(announcement_id.to_string(), move || async move {
                Ok(Arc::new(
                    gateway
                        .list_files(AttachmentOwner::Announcement, announcement_id)
                        .await?,
                ))
            })
            .await
    }

    async fn reload_announcements(&self) -> Result<Arc<Vec<Announcement>>> {
        self.announcements.invalidate(&self.class_id);
        self.fetch_announcements().await
    }

    async fn reload_files(&self, announcement_id: &str) -> Result<Arc<Vec<FileAttachment>>> {
        self.files.invalidate(&announcement_id.to_string());
        self.fetch_files(announcement_id).await
    }

    /// Announcements of the class, with their embedded links
    pub async fn load(&self) -> Result<Arc<Vec<Announcement>>> {
        let result = self.fetch_announcements().await;
        self.record(result)
    }

    pub fn announcements(&self) -> Arc<Vec<Announcement>> {
        self.announcements.list(&self.class_id)
    }

    pub async fn load_files(&self, announcement_id: &str) -> Result<Arc<Vec<FileAttachment>>> {
        let result = self.fetch_files(announcement_id).await;
        self.record(result)
    }

    pub fn files(&self, announcement_id: &str) -> Arc<Vec<FileAttachment>> {
        self.files.list(&announcement_id.to_string())
    }

    fn find(&self, announcement_id: &str) -> Option<Announcement> {
        self.announcements()
            .iter()
            .find(|a| a.id == announcement_id)
            .cloned()
    }

    pub fn permissions(&self, announcement: &Announcement) -> Permissions {
        let files = LockSignals {
            server: announcement.server_locked,
            local: self.locks.is_locked(FILE_LOCK, &announcement.id),
            existing: self.files(&announcement.id).len(),
        };
        let links = LockSignals {
            server: announcement.server_locked,
            local: self.locks.is_locked(LINK_LOCK, &announcement.id),
            existing: announcement.links.len(),
        };
        let subject = Subject::new(EntityKind::Announcement, announcement.author_id.as_deref())
            .with_locks(files, links);
        permissions::resolve(&self.viewer_id, &subject, self.role)
    }

    fn permissions_for(&self, announcement_id: &str) -> Permissions {
        self.find(announcement_id)
            .map(|a| self.permissions(&a))
            .unwrap_or_else(Permissions::none)
    }

    pub async fn post(&self, message: &str) -> Result<()> {
        let result = async {
            let message = required(message, "Escribe un anuncio")?;
            if !is_known_user(&self.viewer_id) {
                return Err(AppError::Validation("Sesión inválida".to_string()));
            }
            tracing::info!("Posting announcement in class {}", self.class_id);
            self.gateway
                .create_announcement(&self.class_id, &self.viewer_id, &message)
                .await?;
            self.reload_announcements().await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    pub async fn delete(&self, announcement_id: &str) -> Result<()> {
        let result = async {
            if !self.permissions_for(announcement_id).can_delete {
                return Err(AppError::NotAuthorized("delete this announcement".to_string()));
            }
            tracing::info!("Deleting announcement {}", announcement_id);
            self.gateway.delete(Removable::Announcement, announcement_id).await?;
            self.files.invalidate(&announcement_id.to_string());
            self.reload_announcements().await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    /// Upload one file; the announcement is file-locked afterwards
    pub async fn attach_file(&self, announcement_id: &str, file: FileUpload) -> Result<()> {
        let result = async {
            if !self.permissions_for(announcement_id).can_attach_file {
                return Err(AppError::NotAuthorized("attach files to this announcement".to_string()));
            }
            self.gateway
                .upload_file(AttachmentOwner::Announcement, announcement_id, file)
                .await?;
            self.locks.lock(FILE_LOCK, announcement_id).await?;
            self.reload_files(announcement_id).await?;
            self.reload_announcements().await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    /// Add one link; the announcement is link-locked afterwards
    pub async fn attach_link(&self, announcement_id: &str, url: &str) -> Result<()> {
        let result = async {
            if !self.permissions_for(announcement_id).can_attach_link {
                return Err(AppError::NotAuthorized("attach links to this announcement".to_string()));
            }
            let url = required(url, "Ingresa el enlace")?;
            tracing::info!("Adding link to announcement {}", announcement_id);
            self.gateway
                .add_link(AttachmentOwner::Announcement, announcement_id, &url)
                .await?;
            self.locks.lock(LINK_LOCK, announcement_id).await?;
            self.reload_announcements().await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    pub async fn delete_file(&self, announcement_id: &str, file_id: &str) -> Result<()> {
        let result = async {
            if !self.permissions_for(announcement_id).can_delete {
                return Err(AppError::NotAuthorized("delete this file".to_string()));
            }
            self.gateway.delete(Removable::AnnouncementFile, file_id).await?;
            self.reload_files(announcement_id).await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    pub async fn delete_link(&self, announcement_id: &str, link_id: &str) -> Result<()> {
        let result = async {
            if !self.permissions_for(announcement_id).can_delete {
                return Err(AppError::NotAuthorized("delete this link".to_string()));
            }
            self.gateway.delete(Removable::AnnouncementLink, link_id).await?;
            self.reload_announcements().await.map(|_| ())
        }
        .await;
        self.record(result)
    }
}
