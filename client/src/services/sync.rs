//! Class content synchronization
//!
//! `ContentSyncController` backs the content screen of one class: topics
//! and tasks up front, materials and quizzes when a topic is expanded,
//! files, links, submissions and comments when a task or material is
//! opened. Every collection lives in an `EntityCache` keyed by its parent.
//!
//! Mutations all run the same way: permission check, remote call,
//! invalidate exactly the affected entries, refetch them. Failures end
//! up in `last_error` for the screen to show; nothing panics.

use super::cache::{CollectionCache, EntityCache};
use super::permissions::{self, LockSignals, Permissions, Subject};
use crate::config::MAX_COMMENT_CHARS;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::remote::{AttachmentOwner, ContentDraft, RemoteGateway, Removable, TaskDraft};
use crate::storage::{ClassLocks, LockKind};
use crate::text::truncate_chars;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Screen lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// Class content that carries files and links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOwner {
    Task,
    Material,
}

impl From<ContentOwner> for AttachmentOwner {
    fn from(owner: ContentOwner) -> Self {
        match owner {
            ContentOwner::Task => AttachmentOwner::Task,
            ContentOwner::Material => AttachmentOwner::Material,
        }
    }
}

/// Everything shown when a task is opened
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskDetails {
    pub files: Vec<FileAttachment>,
    pub links: Vec<Link>,
    pub submissions: Vec<Submission>,
}

pub struct ContentSyncController {
    gateway: RemoteGateway,
    viewer_id: String,
    class_id: String,
    role: ClassRole,
    locks: ClassLocks,
    class_owner: Mutex<Option<String>>,
    state: Mutex<SyncState>,
    last_error: Mutex<Option<String>>,

    topics: CollectionCache<String, Topic>,
    tasks: CollectionCache<String, Task>,
    materials: CollectionCache<String, Material>,
    quizzes: CollectionCache<String, Quiz>,
    task_files: CollectionCache<String, FileAttachment>,
    task_links: CollectionCache<String, Link>,
    material_files: CollectionCache<String, FileAttachment>,
    material_links: CollectionCache<String, Link>,
    submissions: CollectionCache<String, Submission>,
    comments: CollectionCache<String, Comment>,
    user_names: EntityCache<String, String>,
    quiz_grades: EntityCache<String, String>,
}

impl ContentSyncController {
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
            class_owner: Mutex::new(None),
            state: Mutex::new(SyncState::Idle),
            last_error: Mutex::new(None),
            topics: EntityCache::new(),
            tasks: EntityCache::new(),
            materials: EntityCache::new(),
            quizzes: EntityCache::new(),
            task_files: EntityCache::new(),
            task_links: EntityCache::new(),
            material_files: EntityCache::new(),
            material_links: EntityCache::new(),
            submissions: EntityCache::new(),
            comments: EntityCache::new(),
            user_names: EntityCache::new(),
            quiz_grades: EntityCache::new(),
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn role(&self) -> ClassRole {
        self.role
    }

    /// Owner id from the class header, used as the author of class content
    pub fn set_class_owner(&self, owner_id: Option<String>) {
        *self.class_owner.lock() = owner_id;
    }

    pub fn state(&self) -> SyncState {
        self.state.lock().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    // ===== Plumbing =====

    /// Record a failure for the screen and hand it back to the caller
    async fn surface<T>(&self, action: &str, work: impl Future<Output = Result<T>>) -> Result<T> {
        match work.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("{} failed: {}", action, e);
                *self.last_error.lock() = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn require_teacher(&self, action: &str) -> Result<()> {
        if self.role.is_teacher() {
            Ok(())
        } else {
            Err(AppError::NotAuthorized(action.to_string()))
        }
    }

    fn require(&self, allowed: bool, action: &str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(AppError::NotAuthorized(action.to_string()))
        }
    }

    fn files_cache(&self, owner: ContentOwner) -> &CollectionCache<String, FileAttachment> {
        match owner {
            ContentOwner::Task => &self.task_files,
            ContentOwner::Material => &self.material_files,
        }
    }

    fn links_cache(&self, owner: ContentOwner) -> &CollectionCache<String, Link> {
        match owner {
            ContentOwner::Task => &self.task_links,
            ContentOwner::Material => &self.material_links,
        }
    }

    async fn load_topics(&self) -> Result<Arc<Vec<Topic>>> {
        let gateway = &self.gateway;
        let class_id = self.class_id.as_str();
        self.topics
            .ensure_loaded(self.class_id.clone(), move || async move {
                Ok(Arc::new(gateway.list_topics(class_id).await?))
            })
            .await
    }

    async fn load_tasks(&self) -> Result<Arc<Vec<Task>>> {
        let gateway = &self.gateway;
        let class_id = self.class_id.as_str();
        self.tasks
            .ensure_loaded(self.class_id.clone(), move || async move {
                Ok(Arc::new(gateway.list_tasks(class_id).await?))
            })
            .await
    }

    async fn load_materials(&self, topic_id: &str) -> Result<Arc<Vec<Material>>> {
        let gateway = &self.gateway;
        self.materials
            .ensure_loaded(topic_id.to_string(), move || async move {
                Ok(Arc::new(gateway.list_materials(topic_id).await?))
            })
            .await
    }

    async fn load_quizzes(&self, topic_id: &str) -> Result<Arc<Vec<Quiz>>> {
        let gateway = &self.gateway;
        self.quizzes
            .ensure_loaded(topic_id.to_string(), move || async move {
                Ok(Arc::new(gateway.list_quizzes(topic_id).await?))
            })
            .await
    }

    /// Task attachments keep an empty list after a failed fetch; material
    /// attachments are fetched again on the next open.
    async fn load_files(&self, owner: ContentOwner, parent_id: &str) -> Result<Arc<Vec<FileAttachment>>> {
        let gateway = &self.gateway;
        let cache = self.files_cache(owner);
        let key = parent_id.to_string();
        let fetch = move || async move {
            Ok(Arc::new(gateway.list_files(owner.into(), parent_id).await?))
        };
        match owner {
            ContentOwner::Task => cache.ensure_loaded_or_default(key, fetch).await,
            ContentOwner::Material => cache.ensure_loaded(key, fetch).await,
        }
    }

    async fn load_links(&self, owner: ContentOwner, parent_id: &str) -> Result<Arc<Vec<Link>>> {
        let gateway = &self.gateway;
        let cache = self.links_cache(owner);
        let key = parent_id.to_string();
        let fetch = move || async move {
            Ok(Arc::new(gateway.list_links(owner.into(), parent_id).await?))
        };
        match owner {
            ContentOwner::Task => cache.ensure_loaded_or_default(key, fetch).await,
            ContentOwner::Material => cache.ensure_loaded(key, fetch).await,
        }
    }

    async fn load_submissions(&self, task_id: &str) -> Result<Arc<Vec<Submission>>> {
        let gateway = &self.gateway;
        self.submissions
            .ensure_loaded_or_default(task_id.to_string(), move || async move {
                Ok(Arc::new(gateway.list_submissions(task_id).await?))
            })
            .await
    }

    async fn load_comments(&self, task_id: &str) -> Result<Arc<Vec<Comment>>> {
        let gateway = &self.gateway;
        self.comments
            .ensure_loaded(task_id.to_string(), move || async move {
                Ok(Arc::new(gateway.list_comments(task_id).await?))
            })
            .await
    }

    // ===== Screen loads =====

    /// Fetch topics and tasks concurrently.
    ///
    /// Both lists are fetched on every call. One list failing leaves the
    /// other (and its own previous value) in place; any failure puts the
    /// screen in `Error`.
    pub async fn refresh(&self) -> Result<()> {
        *self.state.lock() = SyncState::Loading;
        tracing::debug!("Loading content for class {}", self.class_id);

        match self.fetch_lists().await {
            None => {
                *self.state.lock() = SyncState::Ready;
                Ok(())
            }
            Some(e) => {
                let message = e.to_string();
                tracing::warn!("Loading class {} failed: {}", self.class_id, message);
                *self.state.lock() = SyncState::Error(message.clone());
                *self.last_error.lock() = Some(message);
                Err(e)
            }
        }
    }

    /// Topics and tasks straight from the service; a list is replaced
    /// only when its fetch succeeds. Returns the first failure.
    async fn fetch_lists(&self) -> Option<AppError> {
        let (topics, tasks) = tokio::join!(
            self.gateway.list_topics(&self.class_id),
            self.gateway.list_tasks(&self.class_id)
        );

        let mut failure = None;
        match topics {
            Ok(list) => self.topics.put(self.class_id.clone(), Arc::new(list)),
            Err(e) => failure = Some(e),
        }
        match tasks {
            Ok(list) => self.tasks.put(self.class_id.clone(), Arc::new(list)),
            Err(e) => failure = failure.or(Some(e)),
        }
        failure
    }

    /// Lazily load what an expanded topic shows
    pub async fn expand_topic(&self, topic_id: &str) -> Result<()> {
        self.surface("Loading topic content", async {
            let (materials, quizzes) =
                tokio::join!(self.load_materials(topic_id), self.load_quizzes(topic_id));
            materials.and(quizzes).map(|_| ())
        })
        .await
    }

    /// Returning to the screen: refresh topics and tasks, drop topic content.
    ///
    /// Materials and quizzes of every topic are dropped, along with the
    /// attachments of the materials that were dropped. Task attachments
    /// stay cached. Lists that fail to refresh keep their previous value.
    pub async fn force_reload(&self) -> Result<()> {
        tracing::debug!("Force reload of class {}", self.class_id);

        let failure = self.fetch_lists().await;

        let topic_ids: HashSet<String> = self
            .materials
            .keys()
            .into_iter()
            .chain(self.quizzes.keys())
            .collect();

        let material_ids: Vec<String> = topic_ids
            .iter()
            .flat_map(|topic| self.materials.list(topic).iter().map(|m| m.id.clone()).collect::<Vec<_>>())
            .collect();

        self.material_files.invalidate_many(&material_ids);
        self.material_links.invalidate_many(&material_ids);
        self.materials.invalidate_many(&topic_ids);
        self.quizzes.invalidate_many(&topic_ids);

        match failure {
            Some(e) => {
                *self.last_error.lock() = Some(e.to_string());
                Err(e)
            }
            None => {
                *self.state.lock() = SyncState::Ready;
                Ok(())
            }
        }
    }

    pub fn topics(&self) -> Arc<Vec<Topic>> {
        self.topics.list(&self.class_id)
    }

    pub fn tasks(&self) -> Arc<Vec<Task>> {
        self.tasks.list(&self.class_id)
    }

    pub fn tasks_for_topic(&self, topic_id: &str) -> Vec<Task> {
        self.tasks()
            .iter()
            .filter(|t| t.topic_id == topic_id)
            .cloned()
            .collect()
    }

    pub fn materials(&self, topic_id: &str) -> Arc<Vec<Material>> {
        self.materials.list(&topic_id.to_string())
    }

    pub fn quizzes(&self, topic_id: &str) -> Arc<Vec<Quiz>> {
        self.quizzes.list(&topic_id.to_string())
    }

    pub fn files(&self, owner: ContentOwner, parent_id: &str) -> Arc<Vec<FileAttachment>> {
        self.files_cache(owner).list(&parent_id.to_string())
    }

    pub fn links(&self, owner: ContentOwner, parent_id: &str) -> Arc<Vec<Link>> {
        self.links_cache(owner).list(&parent_id.to_string())
    }

    /// Files, links and submissions of one task
    pub async fn open_task(&self, task_id: &str) -> Result<TaskDetails> {
        self.surface("Loading task", async {
            let (files, links, submissions) = tokio::join!(
                self.load_files(ContentOwner::Task, task_id),
                self.load_links(ContentOwner::Task, task_id),
                self.load_submissions(task_id)
            );
            Ok(TaskDetails {
                files: files?.to_vec(),
                links: links?.to_vec(),
                submissions: self.visible(submissions?.as_slice()),
            })
        })
        .await
    }

    /// Files and links of one material
    pub async fn open_material(&self, material_id: &str) -> Result<()> {
        self.surface("Loading material", async {
            let (files, links) = tokio::join!(
                self.load_files(ContentOwner::Material, material_id),
                self.load_links(ContentOwner::Material, material_id)
            );
            files.and(links).map(|_| ())
        })
        .await
    }

    /// Teachers see every submission, students only their own
    fn visible(&self, submissions: &[Submission]) -> Vec<Submission> {
        submissions
            .iter()
            .filter(|s| self.role.is_teacher() || s.user_id == self.viewer_id)
            .cloned()
            .collect()
    }

    pub fn submissions(&self, task_id: &str) -> Vec<Submission> {
        self.visible(self.submissions.list(&task_id.to_string()).as_slice())
    }

    // ===== Permissions =====

    fn content_author(&self) -> Option<String> {
        let owner = self.class_owner.lock().clone();
        permissions::class_content_author(&self.viewer_id, self.role, owner.as_deref()).map(str::to_string)
    }

    fn lock_signals(&self, owner: ContentOwner, parent_id: &str) -> (LockSignals, LockSignals) {
        let files = LockSignals {
            server: false,
            local: self
                .locks
                .is_locked(LockKind::new(owner.into(), AttachmentKind::File), parent_id),
            existing: self.files(owner, parent_id).len(),
        };
        let links = LockSignals {
            server: false,
            local: self
                .locks
                .is_locked(LockKind::new(owner.into(), AttachmentKind::Link), parent_id),
            existing: self.links(owner, parent_id).len(),
        };
        (files, links)
    }

    pub fn content_permissions(&self, owner: ContentOwner, id: &str) -> Permissions {
        let author = self.content_author();
        let (files, links) = self.lock_signals(owner, id);
        let kind = AttachmentOwner::from(owner).entity_kind();
        let subject = Subject::new(kind, author.as_deref()).with_locks(files, links);
        permissions::resolve(&self.viewer_id, &subject, self.role)
    }

    pub fn administrative_permissions(&self, kind: EntityKind) -> Permissions {
        let author = self.content_author();
        permissions::resolve(&self.viewer_id, &Subject::new(kind, author.as_deref()), self.role)
    }

    pub fn attachment_permissions(&self, kind: EntityKind) -> Permissions {
        self.administrative_permissions(kind)
    }

    pub fn comment_permissions(&self, comment: &Comment) -> Permissions {
        let subject = Subject::new(EntityKind::Comment, Some(comment.author_id.as_str()));
        permissions::resolve(&self.viewer_id, &subject, self.role)
    }

    pub fn submission_permissions(&self, submission: &Submission) -> Permissions {
        let subject = Subject::new(EntityKind::Submission, Some(submission.user_id.as_str()));
        permissions::resolve(&self.viewer_id, &subject, self.role)
    }

    // ===== Topics =====

    async fn reload_topics(&self) -> Result<()> {
        self.topics.invalidate(&self.class_id);
        self.load_topics().await.map(|_| ())
    }

    async fn reload_tasks(&self) -> Result<()> {
        self.tasks.invalidate(&self.class_id);
        self.load_tasks().await.map(|_| ())
    }

    pub async fn create_topic(&self, title: &str) -> Result<()> {
        self.surface("Creating topic", async {
            self.require_teacher("create topics")?;
            let title = required(title, "Ingresa el título")?;
            tracing::info!("Creating topic in class {}: {}", self.class_id, title);
            self.gateway.create_topic(&self.class_id, &title).await?;
            self.reload_topics().await
        })
        .await
    }

    pub async fn update_topic(&self, topic_id: &str, title: &str) -> Result<()> {
        self.surface("Updating topic", async {
            self.require_teacher("edit topics")?;
            let title = required(title, "Ingresa el título")?;
            tracing::info!("Updating topic {}", topic_id);
            self.gateway.update_topic(&self.class_id, topic_id, &title).await?;
            self.reload_topics().await
        })
        .await
    }

    pub async fn delete_topic(&self, topic_id: &str) -> Result<()> {
        self.surface("Deleting topic", async {
            self.require_teacher("delete topics")?;
            self.gateway.delete(Removable::Topic, topic_id).await?;

            let key = topic_id.to_string();
            self.materials.invalidate(&key);
            self.quizzes.invalidate(&key);
            self.reload_topics().await?;
            self.reload_tasks().await
        })
        .await
    }

    // ===== Tasks =====

    /// Returns the id the service assigned, when it reports one
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Option<String>> {
        self.surface("Creating task", async {
            self.require_teacher("create tasks")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Creating task in class {}: {}", self.class_id, draft.title);
            let id = self.gateway.create_task(&self.class_id, draft).await?;
            self.reload_tasks().await?;
            Ok(id)
        })
        .await
    }

    pub async fn update_task(&self, task_id: &str, draft: &TaskDraft) -> Result<()> {
        self.surface("Updating task", async {
            self.require_teacher("edit tasks")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Updating task {}", task_id);
            self.gateway.update_task(task_id, draft).await?;
            self.reload_tasks().await
        })
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.surface("Deleting task", async {
            self.require_teacher("delete tasks")?;
            self.gateway.delete(Removable::Task, task_id).await?;

            let key = task_id.to_string();
            self.task_files.invalidate(&key);
            self.task_links.invalidate(&key);
            self.submissions.invalidate(&key);
            self.comments.invalidate(&key);
            self.reload_tasks().await
        })
        .await
    }

    // ===== Materials =====

    fn topic_holding_material(&self, material_id: &str) -> Option<String> {
        self.materials
            .keys()
            .into_iter()
            .find(|topic| self.materials.list(topic).iter().any(|m| m.id == material_id))
    }

    fn topic_holding_quiz(&self, quiz_id: &str) -> Option<String> {
        self.quizzes
            .keys()
            .into_iter()
            .find(|topic| self.quizzes.list(topic).iter().any(|q| q.id == quiz_id))
    }

    async fn reload_materials(&self, topics: &[Option<String>]) -> Result<()> {
        let keys: HashSet<&String> = topics.iter().flatten().collect();
        for key in keys {
            self.materials.invalidate(key);
            self.load_materials(key).await?;
        }
        Ok(())
    }

    async fn reload_quizzes(&self, topics: &[Option<String>]) -> Result<()> {
        let keys: HashSet<&String> = topics.iter().flatten().collect();
        for key in keys {
            self.quizzes.invalidate(key);
            self.load_quizzes(key).await?;
        }
        Ok(())
    }

    pub async fn create_material(&self, draft: &ContentDraft) -> Result<Option<String>> {
        self.surface("Creating material", async {
            self.require_teacher("create materials")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Creating material in topic {}: {}", draft.topic_id, draft.title);
            let id = self.gateway.create_material(draft).await?;
            self.reload_materials(&[Some(draft.topic_id.clone())]).await?;
            Ok(id)
        })
        .await
    }

    /// Moving a material to another topic refreshes both topics
    pub async fn update_material(&self, material_id: &str, draft: &ContentDraft) -> Result<()> {
        self.surface("Updating material", async {
            self.require_teacher("edit materials")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Updating material {}", material_id);
            let previous = self.topic_holding_material(material_id);
            self.gateway.update_material(material_id, draft).await?;
            self.reload_materials(&[previous, Some(draft.topic_id.clone())]).await
        })
        .await
    }

    pub async fn delete_material(&self, material_id: &str) -> Result<()> {
        self.surface("Deleting material", async {
            self.require_teacher("delete materials")?;
            let topic = self.topic_holding_material(material_id);
            self.gateway.delete(Removable::Material, material_id).await?;

            let key = material_id.to_string();
            self.material_files.invalidate(&key);
            self.material_links.invalidate(&key);
            self.reload_materials(&[topic]).await
        })
        .await
    }

    // ===== Quizzes =====

    pub async fn create_quiz(&self, draft: &ContentDraft) -> Result<Option<String>> {
        self.surface("Creating quiz", async {
            self.require_teacher("create quizzes")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Creating quiz in topic {}: {}", draft.topic_id, draft.title);
            let id = self.gateway.create_quiz(&self.class_id, draft).await?;
            self.reload_quizzes(&[Some(draft.topic_id.clone())]).await?;
            Ok(id)
        })
        .await
    }

    pub async fn update_quiz(&self, quiz_id: &str, draft: &ContentDraft) -> Result<()> {
        self.surface("Updating quiz", async {
            self.require_teacher("edit quizzes")?;
            required(&draft.title, "Ingresa el título")?;
            tracing::info!("Updating quiz {}", quiz_id);
            let previous = self.topic_holding_quiz(quiz_id);
            self.gateway.update_quiz(&self.class_id, quiz_id, draft).await?;
            self.reload_quizzes(&[previous, Some(draft.topic_id.clone())]).await
        })
        .await
    }

    pub async fn delete_quiz(&self, quiz_id: &str) -> Result<()> {
        self.surface("Deleting quiz", async {
            self.require_teacher("delete quizzes")?;
            let topic = self.topic_holding_quiz(quiz_id);
            self.gateway.delete(Removable::Quiz, quiz_id).await?;
            self.quiz_grades.invalidate(&quiz_id.to_string());
            self.reload_quizzes(&[topic]).await
        })
        .await
    }

    /// The viewer's recorded score on a quiz, cached per quiz.
    ///
    /// `None` when no attempt exists; a failed lookup is cached as `None`.
    pub async fn quiz_grade(&self, quiz_id: &str) -> Result<Option<String>> {
        if !is_known_user(&self.viewer_id) {
            return Ok(None);
        }

        let gateway = &self.gateway;
        let viewer = self.viewer_id.as_str();
        let grade = self
            .quiz_grades
            .ensure_loaded_or_default(quiz_id.to_string(), move || async move {
                let attempts = gateway.list_quiz_attempts(quiz_id).await?;
                Ok(attempts
                    .into_iter()
                    .find(|a| a.user_id == viewer)
                    .map(|a| a.score)
                    .unwrap_or_default())
            })
            .await?;

        Ok(Some(grade).filter(|g| !g.is_empty()))
    }

    // ===== Attachments =====

    pub async fn attach_file(&self, owner: ContentOwner, parent_id: &str, file: FileUpload) -> Result<()> {
        self.surface("Uploading file", async {
            let perms = self.content_permissions(owner, parent_id);
            self.require(perms.can_attach_file, "attach files here")?;

            self.gateway.upload_file(owner.into(), parent_id, file).await?;
            self.locks
                .lock(LockKind::new(owner.into(), AttachmentKind::File), parent_id)
                .await?;

            let cache = self.files_cache(owner);
            cache.invalidate(&parent_id.to_string());
            self.load_files(owner, parent_id).await.map(|_| ())
        })
        .await
    }

    pub async fn attach_link(&self, owner: ContentOwner, parent_id: &str, url: &str) -> Result<()> {
        self.surface("Adding link", async {
            let perms = self.content_permissions(owner, parent_id);
            self.require(perms.can_attach_link, "attach links here")?;
            let url = required(url, "Ingresa el enlace")?;

            tracing::info!("Adding link to {:?} {}", owner, parent_id);
            self.gateway.add_link(owner.into(), parent_id, &url).await?;
            self.locks
                .lock(LockKind::new(owner.into(), AttachmentKind::Link), parent_id)
                .await?;

            self.links_cache(owner).invalidate(&parent_id.to_string());
            self.load_links(owner, parent_id).await.map(|_| ())
        })
        .await
    }

    pub async fn delete_file(&self, owner: ContentOwner, parent_id: &str, file_id: &str) -> Result<()> {
        self.surface("Deleting file", async {
            let perms = self.attachment_permissions(EntityKind::AttachmentFile);
            self.require(perms.can_delete, "delete files here")?;

            let owner_kind = AttachmentOwner::from(owner);
            self.gateway.delete(owner_kind.file_removal(), file_id).await?;
            self.files_cache(owner).invalidate(&parent_id.to_string());
            self.load_files(owner, parent_id).await.map(|_| ())
        })
        .await
    }

    pub async fn delete_link(&self, owner: ContentOwner, parent_id: &str, link_id: &str) -> Result<()> {
        self.surface("Deleting link", async {
            let perms = self.attachment_permissions(EntityKind::AttachmentLink);
            self.require(perms.can_delete, "delete links here")?;

            let owner_kind = AttachmentOwner::from(owner);
            self.gateway.delete(owner_kind.link_removal(), link_id).await?;
            self.links_cache(owner).invalidate(&parent_id.to_string());
            self.load_links(owner, parent_id).await.map(|_| ())
        })
        .await
    }

    // ===== Submissions =====

    pub async fn submit_assignment(&self, task_id: &str, file: FileUpload) -> Result<()> {
        self.surface("Submitting assignment", async {
            if self.role.is_teacher() {
                return Err(AppError::NotAuthorized("submit assignments".to_string()));
            }
            if !is_known_user(&self.viewer_id) {
                return Err(AppError::Validation("Sesión inválida".to_string()));
            }

            tracing::info!("Submitting {} for task {}", file.file_name, task_id);
            self.gateway
                .upload_submission(task_id, &self.viewer_id, file)
                .await?;
            self.submissions.invalidate(&task_id.to_string());
            self.load_submissions(task_id).await.map(|_| ())
        })
        .await
    }

    pub async fn delete_submission(&self, task_id: &str, submission_id: &str) -> Result<()> {
        self.surface("Deleting submission", async {
            let submission = self
                .submissions
                .list(&task_id.to_string())
                .iter()
                .find(|s| s.id == submission_id)
                .cloned();
            let allowed = submission
                .as_ref()
                .is_some_and(|s| self.submission_permissions(s).can_delete);
            self.require(allowed, "delete this submission")?;

            self.gateway.delete(Removable::Submission, submission_id).await?;
            self.submissions.invalidate(&task_id.to_string());
            self.load_submissions(task_id).await.map(|_| ())
        })
        .await
    }

    // ===== Comments =====

    /// Comments of a task, oldest first, with author names preloaded
    pub async fn open_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        self.surface("Loading comments", async {
            let comments = self.load_comments(task_id).await?;
            let authors: HashSet<&str> = comments.iter().map(|c| c.author_id.as_str()).collect();
            for author in authors {
                self.load_user_name(author).await;
            }
            Ok(comments.to_vec())
        })
        .await
    }

    /// Name lookups never fail the screen; a failed lookup caches a blank
    async fn load_user_name(&self, user_id: &str) {
        if user_id.trim().is_empty() {
            return;
        }
        let gateway = &self.gateway;
        let result = self
            .user_names
            .ensure_loaded_or_default(user_id.to_string(), move || async move {
                Ok(gateway
                    .user_by_id(user_id)
                    .await?
                    .map(|u| u.name)
                    .unwrap_or_default())
            })
            .await;
        if let Err(e) = result {
            tracing::debug!("Name lookup for user {} failed: {}", user_id, e);
        }
    }

    pub fn author_name(&self, user_id: &str) -> Option<String> {
        self.user_names
            .get(&user_id.to_string())
            .filter(|name| !name.trim().is_empty())
    }

    pub fn comments(&self, task_id: &str) -> Arc<Vec<Comment>> {
        self.comments.list(&task_id.to_string())
    }

    /// Trimmed, non-blank, cut to the comment limit
    pub async fn add_comment(&self, task_id: &str, text: &str) -> Result<()> {
        self.surface("Posting comment", async {
            let text = required(text, "Escribe un comentario")?;
            let text = truncate_chars(&text, MAX_COMMENT_CHARS);

            tracing::info!("Posting comment on task {}", task_id);
            self.gateway
                .create_comment(task_id, &self.viewer_id, &text)
                .await?;
            self.comments.invalidate(&task_id.to_string());
            self.load_comments(task_id).await?;
            self.load_user_name(&self.viewer_id).await;
            Ok(())
        })
        .await
    }

    pub async fn delete_comment(&self, task_id: &str, comment_id: &str) -> Result<()> {
        self.surface("Deleting comment", async {
            let allowed = self
                .comments(task_id)
                .iter()
                .find(|c| c.id == comment_id)
                .is_some_and(|c| self.comment_permissions(c).can_delete);
            self.require(allowed, "delete this comment")?;

            self.gateway.delete(Removable::Comment, comment_id).await?;
            self.comments.invalidate(&task_id.to_string());
            self.load_comments(task_id).await.map(|_| ())
        })
        .await
    }
}

/// Trimmed text, or a validation error when blank
pub(crate) fn required(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Repository};
    use crate::remote::endpoints as ep;
    use crate::remote::scripted::ScriptedTransport;
    use crate::remote::Payload;
    use crate::storage::LockStore;
    use sqlx::sqlite::SqlitePoolOptions;

    fn session(user_id: &str) -> Session {
        Session {
            user_id: user_id.to_string(),
            role: "alumno".to_string(),
            display_name: "Ana".to_string(),
            email: None,
        }
    }

    async fn controller(
        transport: &Arc<ScriptedTransport>,
        viewer: &str,
        role: ClassRole,
    ) -> ContentSyncController {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let locks = LockStore::open(Repository::new(pool)).await.unwrap();

        ContentSyncController::new(
            RemoteGateway::new(transport.clone()),
            &session(viewer),
            "3",
            role,
            locks.scope(viewer, "3"),
        )
    }

    fn with_content(transport: &ScriptedTransport) {
        transport.reply(ep::LIST_TOPICS, r#"[{"id":1,"titulo":"Uno"},{"id":2,"titulo":"Dos"}]"#);
        transport.reply(
            ep::LIST_TASKS,
            r#"[{"id":8,"id_tema":1,"titulo":"Ensayo","valor":10,"fecha_entrega":"2025-01-01 10:00:00"}]"#,
        );
        transport.reply(ep::LIST_MATERIALS, r#"[{"id":4,"id_tema":1,"titulo":"Lectura"}]"#);
        transport.reply(ep::LIST_QUIZZES, r#"[{"id":5,"id_tema":1,"titulo":"Repaso"}]"#);
    }

    #[tokio::test]
    async fn test_refresh_reaches_ready() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;

        assert_eq!(ctl.state(), SyncState::Idle);
        ctl.refresh().await.unwrap();

        assert_eq!(ctl.state(), SyncState::Ready);
        assert_eq!(ctl.topics().len(), 2);
        assert_eq!(ctl.tasks_for_topic("1").len(), 1);

        ctl.refresh().await.unwrap();
        assert_eq!(transport.count(ep::LIST_TOPICS), 2);
        assert_eq!(transport.count(ep::LIST_TASKS), 2);
    }

    #[tokio::test]
    async fn test_refresh_after_failure_fetches_again() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.fail(ep::LIST_TASKS, "timeout");
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;

        assert!(ctl.refresh().await.is_err());

        with_content(&transport);
        ctl.refresh().await.unwrap();

        assert_eq!(ctl.state(), SyncState::Ready);
        assert_eq!(ctl.tasks().len(), 1);
        assert_eq!(transport.count(ep::LIST_TASKS), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_tasks() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;
        ctl.refresh().await.unwrap();

        transport.fail(ep::LIST_TASKS, "timeout");
        assert!(ctl.refresh().await.is_err());
        assert_eq!(ctl.tasks().len(), 1);
        assert_eq!(ctl.state(), SyncState::Error("timeout".to_string()));
    }

    #[tokio::test]
    async fn test_expand_topic_after_failure_fetches_again() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.fail(ep::LIST_MATERIALS, "sin conexión");
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        assert!(ctl.expand_topic("1").await.is_err());
        assert!(ctl.materials("1").is_empty());

        with_content(&transport);
        ctl.expand_topic("1").await.unwrap();

        assert_eq!(ctl.materials("1")[0].title, "Lectura");
        assert_eq!(transport.count(ep::LIST_MATERIALS), 2);
        assert_eq!(transport.count(ep::LIST_QUIZZES), 1);
    }

    #[tokio::test]
    async fn test_failed_task_files_stay_empty_until_invalidated() {
        let transport = ScriptedTransport::new();
        transport.fail(ep::LIST_TASK_FILES, "timeout");
        transport.reply(ep::LIST_TASK_LINKS, "[]");
        transport.reply(ep::LIST_SUBMISSIONS, "[]");
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        assert!(ctl.open_task("8").await.is_err());

        transport.reply(ep::LIST_TASK_FILES, r#"[{"id":1,"nombre":"guia.pdf"}]"#);
        let details = ctl.open_task("8").await.unwrap();

        assert!(details.files.is_empty());
        assert_eq!(transport.count(ep::LIST_TASK_FILES), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_list() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.fail(ep::LIST_TASKS, "timeout");
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;

        let err = ctl.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "timeout");
        assert_eq!(ctl.state(), SyncState::Error("timeout".to_string()));
        assert_eq!(ctl.topics().len(), 2);
        assert!(ctl.tasks().is_empty());
        assert_eq!(ctl.last_error().as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_expand_topic_loads_once() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        ctl.expand_topic("1").await.unwrap();
        ctl.expand_topic("1").await.unwrap();

        assert_eq!(transport.count(ep::LIST_MATERIALS), 1);
        assert_eq!(transport.count(ep::LIST_QUIZZES), 1);
        assert_eq!(ctl.materials("1")[0].title, "Lectura");
    }

    #[tokio::test]
    async fn test_concurrent_expands_share_one_fetch() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.set_delay(std::time::Duration::from_millis(20));
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        let (a, b) = tokio::join!(ctl.expand_topic("1"), ctl.expand_topic("1"));
        a.unwrap();
        b.unwrap();

        assert_eq!(transport.count(ep::LIST_MATERIALS), 1);
        assert_eq!(transport.count(ep::LIST_QUIZZES), 1);
    }

    #[tokio::test]
    async fn test_deleting_a_material_refreshes_only_its_topic() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.reply(ep::DELETE_MATERIAL, "Registro eliminado");
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;

        ctl.expand_topic("1").await.unwrap();
        transport.reply(ep::LIST_MATERIALS, "[]");
        ctl.expand_topic("2").await.unwrap();
        transport.clear_calls();

        ctl.delete_material("4").await.unwrap();

        let reloads: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|c| c.endpoint == ep::LIST_MATERIALS)
            .collect();
        assert_eq!(reloads.len(), 1);
        match &reloads[0].payload {
            Payload::Json(body) => assert_eq!(body["id_tema"], 1),
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(transport.count(ep::LIST_QUIZZES), 0);
    }

    #[tokio::test]
    async fn test_force_reload_drops_topic_content_but_not_task_files() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.reply(ep::LIST_TASK_FILES, "[]");
        transport.reply(ep::LIST_TASK_LINKS, "[]");
        transport.reply(ep::LIST_SUBMISSIONS, "[]");
        transport.reply(ep::LIST_MATERIAL_FILES, "[]");
        transport.reply(ep::LIST_MATERIAL_LINKS, "[]");
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        ctl.refresh().await.unwrap();
        ctl.expand_topic("1").await.unwrap();
        ctl.open_task("8").await.unwrap();
        ctl.open_material("4").await.unwrap();

        ctl.force_reload().await.unwrap();
        assert!(ctl.materials("1").is_empty());

        ctl.expand_topic("1").await.unwrap();
        ctl.open_task("8").await.unwrap();
        ctl.open_material("4").await.unwrap();

        assert_eq!(transport.count(ep::LIST_TOPICS), 2);
        assert_eq!(transport.count(ep::LIST_MATERIALS), 2);
        assert_eq!(transport.count(ep::LIST_MATERIAL_FILES), 2);
        assert_eq!(transport.count(ep::LIST_TASK_FILES), 1);
    }

    #[tokio::test]
    async fn test_force_reload_keeps_topics_on_failure() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        let ctl = controller(&transport, "9", ClassRole::Student).await;
        ctl.refresh().await.unwrap();

        transport.fail(ep::LIST_TOPICS, "sin conexión");
        assert!(ctl.force_reload().await.is_err());
        assert_eq!(ctl.topics().len(), 2);
    }

    #[tokio::test]
    async fn test_student_cannot_create_topic() {
        let transport = ScriptedTransport::new();
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        let err = ctl.create_topic("Nuevo").await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_attach_locks_immediately() {
        let transport = ScriptedTransport::new();
        with_content(&transport);
        transport.reply(ep::UPLOAD_TASK_FILE, r#"{"status":"ok"}"#);
        // The service has not caught up yet and still lists no files
        transport.reply(ep::LIST_TASK_FILES, "[]");
        transport.reply(ep::LIST_TASK_LINKS, "[]");
        transport.reply(ep::LIST_SUBMISSIONS, "[]");
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;
        ctl.open_task("8").await.unwrap();

        assert!(ctl.content_permissions(ContentOwner::Task, "8").can_attach_file);

        ctl.attach_file(
            ContentOwner::Task,
            "8",
            FileUpload::new("guia.pdf", "application/pdf", vec![1]),
        )
        .await
        .unwrap();

        let perms = ctl.content_permissions(ContentOwner::Task, "8");
        assert!(!perms.can_attach_file);
        assert!(perms.can_attach_link);

        let err = ctl
            .attach_file(ContentOwner::Task, "8", FileUpload::new("b.pdf", "application/pdf", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
        assert_eq!(transport.count(ep::UPLOAD_TASK_FILE), 1);
    }

    #[tokio::test]
    async fn test_student_sees_only_own_submissions() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::LIST_TASK_FILES, "[]");
        transport.reply(ep::LIST_TASK_LINKS, "[]");
        transport.reply(
            ep::LIST_SUBMISSIONS,
            r#"[{"id":1,"id_usuario":9,"calificacion":"90"},{"id":2,"id_usuario":10}]"#,
        );
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        let details = ctl.open_task("8").await.unwrap();
        assert_eq!(details.submissions.len(), 1);
        assert_eq!(details.submissions[0].grade.as_deref(), Some("90"));
    }

    #[tokio::test]
    async fn test_comment_is_trimmed_and_truncated() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::CREATE_COMMENT, r#"{"success":true}"#);
        transport.reply(ep::LIST_COMMENTS, "[]");
        transport.reply(ep::USER_BY_ID, r#"[{"id":9,"nombre":"Ana"}]"#);
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        let long = format!("  {}  ", "x".repeat(900));
        ctl.add_comment("8", &long).await.unwrap();

        let sent = transport
            .calls()
            .into_iter()
            .find(|c| c.endpoint == ep::CREATE_COMMENT)
            .unwrap();
        match sent.payload {
            Payload::Json(body) => {
                assert_eq!(body["comentario"].as_str().unwrap().chars().count(), MAX_COMMENT_CHARS)
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let err = ctl.add_comment("8", "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(ctl.author_name("9").as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_only_author_deletes_comment() {
        let transport = ScriptedTransport::new();
        transport.reply(
            ep::LIST_COMMENTS,
            r#"[{"id":1,"id_tarea":8,"id_usuario":9,"comentario":"hola","fecha_comentario":"2025-01-02 00:00:00"},
                {"id":2,"id_tarea":8,"id_usuario":10,"comentario":"adios","fecha_comentario":"2025-01-01 00:00:00"}]"#,
        );
        transport.reply(ep::USER_BY_ID, "[]");
        transport.reply(ep::DELETE_COMMENT, "ok");
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        let comments = ctl.open_comments("8").await.unwrap();
        assert_eq!(comments[0].id, "2");

        assert!(ctl.delete_comment("8", "2").await.is_err());
        ctl.delete_comment("8", "1").await.unwrap();
        assert_eq!(transport.count(ep::DELETE_COMMENT), 1);
    }

    #[tokio::test]
    async fn test_quiz_grade_is_cached() {
        let transport = ScriptedTransport::new();
        transport.reply(
            ep::LIST_QUIZ_ATTEMPTS,
            r#"[{"id":1,"id_usuario":10,"calificacion":"50.00"},{"id":2,"id_usuario":9,"calificacion":"75.00"}]"#,
        );
        let ctl = controller(&transport, "9", ClassRole::Student).await;

        assert_eq!(ctl.quiz_grade("5").await.unwrap().as_deref(), Some("75.00"));
        assert_eq!(ctl.quiz_grade("5").await.unwrap().as_deref(), Some("75.00"));
        assert_eq!(transport.count(ep::LIST_QUIZ_ATTEMPTS), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced() {
        let transport = ScriptedTransport::new();
        transport.reply_status(ep::CREATE_TOPIC, 500, "");
        let ctl = controller(&transport, "5", ClassRole::Teacher).await;

        let err = ctl.create_topic("Nuevo").await.unwrap_err();
        assert_eq!(err.to_string(), "Error 500");
        assert_eq!(ctl.last_error().as_deref(), Some("Error 500"));
        assert_eq!(transport.count(ep::LIST_TOPICS), 0);
    }
}
