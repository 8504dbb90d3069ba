//! Typed gateway to the remote service
//!
//! One method per resource and verb. Replies are normalized into the
//! canonical models here; callers never see raw JSON. No retries are
//! performed at this layer.

use super::endpoints as ep;
use super::transport::{Payload, Transport};
use super::wire::{self, id_value, WireObject};
use crate::error::{AppError, Result};
use crate::models::*;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Entities that own file and link attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentOwner {
    Task,
    Material,
    Announcement,
}

impl AttachmentOwner {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            AttachmentOwner::Task => EntityKind::Task,
            AttachmentOwner::Material => EntityKind::Material,
            AttachmentOwner::Announcement => EntityKind::Announcement,
        }
    }

    /// Request key naming the owner on the file endpoints
    fn file_parent_key(self) -> &'static str {
        match self {
            AttachmentOwner::Task => "id_tareas",
            AttachmentOwner::Material => "id_material",
            AttachmentOwner::Announcement => "id_anuncio",
        }
    }

    /// Request key naming the owner on the link endpoints
    fn link_parent_key(self) -> &'static str {
        match self {
            AttachmentOwner::Task => "id_tareas",
            AttachmentOwner::Material => "id_material",
            AttachmentOwner::Announcement => "id_anuncios",
        }
    }

    /// Reply keys that may carry the owner id
    fn reply_parent_keys(self) -> &'static [&'static str] {
        match self {
            AttachmentOwner::Task => &["id_tareas", "id_tarea"],
            AttachmentOwner::Material => &["id_material"],
            AttachmentOwner::Announcement => &["id_anuncio", "id_anuncios"],
        }
    }

    fn list_files_endpoint(self) -> &'static str {
        match self {
            AttachmentOwner::Task => ep::LIST_TASK_FILES,
            AttachmentOwner::Material => ep::LIST_MATERIAL_FILES,
            AttachmentOwner::Announcement => ep::LIST_ANNOUNCEMENT_FILES,
        }
    }

    fn upload_endpoint(self) -> &'static str {
        match self {
            AttachmentOwner::Task => ep::UPLOAD_TASK_FILE,
            AttachmentOwner::Material => ep::UPLOAD_MATERIAL_FILE,
            AttachmentOwner::Announcement => ep::UPLOAD_ANNOUNCEMENT_FILE,
        }
    }

    /// The announcement upload names its owner in the plural form
    fn upload_parent_key(self) -> &'static str {
        match self {
            AttachmentOwner::Announcement => "id_anuncios",
            other => other.file_parent_key(),
        }
    }

    fn list_links_endpoint(self) -> &'static str {
        match self {
            AttachmentOwner::Task => ep::LIST_TASK_LINKS,
            AttachmentOwner::Material => ep::LIST_MATERIAL_LINKS,
            AttachmentOwner::Announcement => ep::LIST_ANNOUNCEMENT_LINKS,
        }
    }

    fn create_link_endpoint(self) -> &'static str {
        match self {
            AttachmentOwner::Task => ep::CREATE_TASK_LINK,
            AttachmentOwner::Material => ep::CREATE_MATERIAL_LINK,
            AttachmentOwner::Announcement => ep::CREATE_ANNOUNCEMENT_LINK,
        }
    }

    pub fn file_removal(self) -> Removable {
        match self {
            AttachmentOwner::Task => Removable::TaskFile,
            AttachmentOwner::Material => Removable::MaterialFile,
            AttachmentOwner::Announcement => Removable::AnnouncementFile,
        }
    }

    pub fn link_removal(self) -> Removable {
        match self {
            AttachmentOwner::Task => Removable::TaskLink,
            AttachmentOwner::Material => Removable::MaterialLink,
            AttachmentOwner::Announcement => Removable::AnnouncementLink,
        }
    }
}

/// Everything that can be deleted by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removable {
    Topic,
    Task,
    TaskFile,
    TaskLink,
    Submission,
    Material,
    MaterialFile,
    MaterialLink,
    Quiz,
    Question,
    Comment,
    Announcement,
    AnnouncementFile,
    AnnouncementLink,
    Enrollment,
}

impl Removable {
    fn endpoint(self) -> &'static str {
        match self {
            Removable::Topic => ep::DELETE_TOPIC,
            Removable::Task => ep::DELETE_TASK,
            Removable::TaskFile => ep::DELETE_TASK_FILE,
            Removable::TaskLink => ep::DELETE_TASK_LINK,
            Removable::Submission => ep::DELETE_SUBMISSION,
            Removable::Material => ep::DELETE_MATERIAL,
            Removable::MaterialFile => ep::DELETE_MATERIAL_FILE,
            Removable::MaterialLink => ep::DELETE_MATERIAL_LINK,
            Removable::Quiz => ep::DELETE_QUIZ,
            Removable::Question => ep::DELETE_QUESTION,
            Removable::Comment => ep::DELETE_COMMENT,
            Removable::Announcement => ep::DELETE_ANNOUNCEMENT,
            Removable::AnnouncementFile => ep::DELETE_ANNOUNCEMENT_FILE,
            Removable::AnnouncementLink => ep::DELETE_ANNOUNCEMENT_LINK,
            Removable::Enrollment => ep::EXPEL_STUDENT,
        }
    }
}

/// Fields of a new or edited task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub points: f64,
    /// "YYYY-MM-DD HH:mm:ss"
    pub due_at: String,
}

/// Fields of a new or edited material or quiz
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub topic_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub prompt: String,
    /// Up to four options; blanks are sent as null
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDraft {
    pub name: String,
    pub subject: String,
    pub description: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    rol: Option<String>,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Gateway over any `Transport`
#[derive(Clone)]
pub struct RemoteGateway {
    transport: Arc<dyn Transport>,
}

impl RemoteGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    // ===== Plumbing =====

    /// POST and return the body of a 2xx reply
    async fn call(&self, endpoint: &str, payload: Payload) -> Result<String> {
        let response = self.transport.post(endpoint, payload).await?;
        if !response.is_success() {
            return Err(AppError::Server(response.status));
        }
        Ok(response.body)
    }

    /// POST a mutation; 2xx bodies that report failure become `Rejected`
    async fn mutate(&self, endpoint: &str, payload: Payload) -> Result<String> {
        let body = self.call(endpoint, payload).await?;
        if let Some(message) = wire::reported_failure(&body) {
            tracing::warn!("{} rejected: {}", endpoint, message);
            return Err(AppError::Rejected(message));
        }
        Ok(body)
    }

    async fn rows(&self, endpoint: &str, payload: Payload) -> Result<Vec<Map<String, Value>>> {
        let body = self.call(endpoint, payload).await?;
        wire::object_rows(&body)
    }

    async fn list<T>(
        &self,
        endpoint: &str,
        payload: Payload,
        convert: impl Fn(WireObject) -> Option<T>,
    ) -> Result<Vec<T>> {
        let rows = self.rows(endpoint, payload).await?;
        let total = rows.len();
        let items: Vec<T> = rows.iter().map(WireObject::new).filter_map(convert).collect();
        if items.len() < total {
            tracing::debug!("{}: skipped {} rows without an id", endpoint, total - items.len());
        }
        Ok(items)
    }

    fn by_id(key: &str, id: &str) -> Payload {
        let mut body = Map::new();
        body.insert(key.to_string(), id_value(id));
        Payload::Json(Value::Object(body))
    }

    // ===== Session =====

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let payload = Payload::Form(vec![
            ("email".to_string(), email.to_string()),
            ("pass".to_string(), password.to_string()),
        ]);
        let body = self.call(ep::LOGIN, payload).await?;
        let reply: LoginReply = serde_json::from_str(body.trim())
            .map_err(|e| AppError::Decode(format!("login reply: {}", e)))?;

        let user_id = reply.id.as_ref().and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        match (reply.success, user_id) {
            (true, Some(user_id)) => Ok(Session {
                user_id,
                role: reply.rol.unwrap_or_default(),
                display_name: reply.nombre.unwrap_or_default(),
                email: reply.email,
            }),
            _ => Err(AppError::Rejected(
                reply
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Credenciales no válidas".to_string()),
            )),
        }
    }

    /// Returns the confirmation (or refusal) text of the service
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<String> {
        let payload = Payload::Json(json!({
            "nombre": name,
            "email": email,
            "password": password,
        }));
        let body = self.call(ep::REGISTER, payload).await?;
        Ok(body.trim().to_string())
    }

    pub async fn user_by_id(&self, user_id: &str) -> Result<Option<UserSummary>> {
        let users = self
            .list(ep::USER_BY_ID, Self::by_id("id", user_id), wire::user_summary)
            .await?;
        Ok(users.into_iter().next())
    }

    // ===== Classes =====

    pub async fn taught_classes(&self, user_id: &str) -> Result<Vec<ClassInfo>> {
        self.list(ep::TAUGHT_CLASSES, Self::by_id("id_usuario", user_id), wire::class_info)
            .await
    }

    pub async fn enrolled_classes(&self, user_id: &str) -> Result<Vec<ClassInfo>> {
        self.list(ep::ENROLLED_CLASSES, Self::by_id("id_usuario", user_id), wire::class_info)
            .await
    }

    pub async fn class_by_id(&self, class_id: &str) -> Result<Option<ClassInfo>> {
        let classes = self
            .list(ep::CLASS_BY_ID, Self::by_id("id", class_id), wire::class_info)
            .await?;
        Ok(classes.into_iter().next())
    }

    pub async fn create_class(&self, owner_id: &str, draft: &ClassDraft) -> Result<()> {
        let payload = Payload::Json(json!({
            "nombre": draft.name,
            "materia": draft.subject,
            "descripcion": draft.description,
            "codigo": draft.code,
            "id_usuario": owner_id,
        }));
        self.mutate(ep::CREATE_CLASS, payload).await.map(|_| ())
    }

    pub async fn join_class(&self, user_id: &str, code: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "codigo": code,
            "id_usuario": user_id,
        }));
        self.mutate(ep::JOIN_CLASS, payload).await.map(|_| ())
    }

    pub async fn roster(&self, class_id: &str) -> Result<Vec<Enrollment>> {
        self.list(ep::CLASS_ROSTER, Self::by_id("id_clase", class_id), wire::enrollment)
            .await
    }

    // ===== Topics =====

    pub async fn list_topics(&self, class_id: &str) -> Result<Vec<Topic>> {
        self.list(ep::LIST_TOPICS, Self::by_id("id_clase", class_id), |o| {
            wire::topic(o, class_id)
        })
        .await
    }

    pub async fn create_topic(&self, class_id: &str, title: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "titulo": title,
            "id_clase": id_value(class_id),
        }));
        self.mutate(ep::CREATE_TOPIC, payload).await.map(|_| ())
    }

    pub async fn update_topic(&self, class_id: &str, topic_id: &str, title: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "id": id_value(topic_id),
            "titulo": title,
            "id_clase": id_value(class_id),
        }));
        self.mutate(ep::UPDATE_TOPIC, payload).await.map(|_| ())
    }

    // ===== Tasks =====

    pub async fn list_tasks(&self, class_id: &str) -> Result<Vec<Task>> {
        self.list(ep::LIST_TASKS, Self::by_id("id_clase", class_id), |o| {
            wire::task(o, class_id)
        })
        .await
    }

    /// Returns the new task id when the service reports one
    pub async fn create_task(&self, class_id: &str, draft: &TaskDraft) -> Result<Option<String>> {
        let payload = Payload::Json(json!({
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
            "valor": draft.points,
            "fecha_entrega": draft.due_at,
            "id_clase": id_value(class_id),
        }));
        let body = self.mutate(ep::CREATE_TASK, payload).await?;
        Ok(wire::parse_created_id(&body))
    }

    pub async fn update_task(&self, task_id: &str, draft: &TaskDraft) -> Result<()> {
        let payload = Payload::Json(json!({
            "id": id_value(task_id),
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
            "valor": draft.points,
            "fecha_entrega": draft.due_at,
        }));
        self.mutate(ep::UPDATE_TASK, payload).await.map(|_| ())
    }

    // ===== Submissions =====

    pub async fn list_submissions(&self, task_id: &str) -> Result<Vec<Submission>> {
        self.list(ep::LIST_SUBMISSIONS, Self::by_id("id_tareas", task_id), |o| {
            wire::submission(o, task_id)
        })
        .await
    }

    pub async fn upload_submission(&self, task_id: &str, user_id: &str, file: FileUpload) -> Result<()> {
        let metadata = json!({
            "id_tareas": id_value(task_id),
            "id_usuario": id_value(user_id),
        });
        self.mutate(ep::UPLOAD_SUBMISSION, Payload::Multipart { metadata, file })
            .await
            .map(|_| ())
    }

    // ===== Materials =====

    pub async fn list_materials(&self, topic_id: &str) -> Result<Vec<Material>> {
        self.list(ep::LIST_MATERIALS, Self::by_id("id_tema", topic_id), |o| {
            wire::material(o, topic_id)
        })
        .await
    }

    pub async fn create_material(&self, draft: &ContentDraft) -> Result<Option<String>> {
        let payload = Payload::Json(json!({
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
        }));
        let body = self.mutate(ep::CREATE_MATERIAL, payload).await?;
        Ok(wire::parse_created_id(&body))
    }

    pub async fn update_material(&self, material_id: &str, draft: &ContentDraft) -> Result<()> {
        let payload = Payload::Json(json!({
            "id": id_value(material_id),
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
        }));
        self.mutate(ep::UPDATE_MATERIAL, payload).await.map(|_| ())
    }

    // ===== Quizzes =====

    pub async fn list_quizzes(&self, topic_id: &str) -> Result<Vec<Quiz>> {
        self.list(ep::LIST_QUIZZES, Self::by_id("id_tema", topic_id), |o| {
            wire::quiz(o, topic_id)
        })
        .await
    }

    pub async fn create_quiz(&self, class_id: &str, draft: &ContentDraft) -> Result<Option<String>> {
        let payload = Payload::Json(json!({
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
            "id_clase": id_value(class_id),
        }));
        let body = self.mutate(ep::CREATE_QUIZ, payload).await?;
        Ok(wire::parse_created_id(&body))
    }

    pub async fn update_quiz(&self, class_id: &str, quiz_id: &str, draft: &ContentDraft) -> Result<()> {
        let payload = Payload::Json(json!({
            "id": id_value(quiz_id),
            "id_tema": id_value(&draft.topic_id),
            "titulo": draft.title,
            "descripcion": draft.description,
            "id_clase": id_value(class_id),
        }));
        self.mutate(ep::UPDATE_QUIZ, payload).await.map(|_| ())
    }

    /// The service only lists every question; filter to one quiz
    pub async fn list_questions(&self, quiz_id: &str) -> Result<Vec<Question>> {
        let all = self.list(ep::LIST_QUESTIONS, Payload::Empty, wire::question).await?;
        Ok(all.into_iter().filter(|q| q.quiz_id == quiz_id).collect())
    }

    pub async fn create_question(&self, quiz_id: &str, draft: &QuestionDraft) -> Result<()> {
        let mut body = question_body(draft);
        body.insert("id_cuestionario".to_string(), id_value(quiz_id));
        self.mutate(ep::CREATE_QUESTION, Payload::Json(Value::Object(body)))
            .await
            .map(|_| ())
    }

    pub async fn update_question(&self, question_id: &str, draft: &QuestionDraft) -> Result<()> {
        let mut body = question_body(draft);
        body.insert("id".to_string(), id_value(question_id));
        self.mutate(ep::UPDATE_QUESTION, Payload::Json(Value::Object(body)))
            .await
            .map(|_| ())
    }

    pub async fn list_quiz_attempts(&self, quiz_id: &str) -> Result<Vec<QuizAttempt>> {
        self.list(ep::LIST_QUIZ_ATTEMPTS, Self::by_id("id_cuestionario", quiz_id), |o| {
            wire::quiz_attempt(o, quiz_id)
        })
        .await
    }

    pub async fn record_quiz_attempt(&self, quiz_id: &str, user_id: &str, score: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "id_cuestionario": id_value(quiz_id),
            "id_usuario": id_value(user_id),
            "calificacion": score,
        }));
        self.mutate(ep::RECORD_QUIZ_ATTEMPT, payload).await.map(|_| ())
    }

    // ===== Comments =====

    /// The service only lists every comment; filter to one task, oldest first
    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        let all = self.list(ep::LIST_COMMENTS, Payload::Empty, wire::comment).await?;
        let mut mine: Vec<Comment> = all.into_iter().filter(|c| c.task_id == task_id).collect();
        mine.sort_by(|a, b| a.posted_at.cmp(&b.posted_at));
        Ok(mine)
    }

    pub async fn create_comment(&self, task_id: &str, user_id: &str, text: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "id_tarea": id_value(task_id),
            "id_usuario": id_value(user_id),
            "comentario": text,
        }));
        self.mutate(ep::CREATE_COMMENT, payload).await.map(|_| ())
    }

    // ===== Announcements =====

    pub async fn list_announcements(&self, class_id: &str) -> Result<Vec<Announcement>> {
        self.list(ep::LIST_ANNOUNCEMENTS, Self::by_id("id_clase", class_id), |o| {
            wire::announcement(o, class_id)
        })
        .await
    }

    pub async fn create_announcement(&self, class_id: &str, user_id: &str, message: &str) -> Result<()> {
        let payload = Payload::Json(json!({
            "id_clase": class_id,
            "id_usuario": user_id,
            "mensaje": message,
        }));
        self.mutate(ep::CREATE_ANNOUNCEMENT, payload).await.map(|_| ())
    }

    // ===== Attachments =====

    pub async fn list_files(&self, owner: AttachmentOwner, parent_id: &str) -> Result<Vec<FileAttachment>> {
        let keys = owner.reply_parent_keys();
        self.list(
            owner.list_files_endpoint(),
            Self::by_id(owner.file_parent_key(), parent_id),
            |o| wire::file_attachment(o, keys, parent_id),
        )
        .await
    }

    pub async fn list_links(&self, owner: AttachmentOwner, parent_id: &str) -> Result<Vec<Link>> {
        let keys = owner.reply_parent_keys();
        self.list(
            owner.list_links_endpoint(),
            Self::by_id(owner.link_parent_key(), parent_id),
            |o| wire::link(o, keys, parent_id),
        )
        .await
    }

    /// Binary part plus `{"<owner key>": id}` metadata in one multipart request
    pub async fn upload_file(&self, owner: AttachmentOwner, parent_id: &str, file: FileUpload) -> Result<()> {
        tracing::info!(
            "Uploading {} ({} bytes) to {:?} {}",
            file.file_name,
            file.bytes.len(),
            owner,
            parent_id
        );
        let mut metadata = Map::new();
        metadata.insert(owner.upload_parent_key().to_string(), id_value(parent_id));
        let payload = Payload::Multipart {
            metadata: Value::Object(metadata),
            file,
        };
        self.mutate(owner.upload_endpoint(), payload).await.map(|_| ())
    }

    pub async fn add_link(&self, owner: AttachmentOwner, parent_id: &str, url: &str) -> Result<()> {
        let mut body = Map::new();
        body.insert(owner.link_parent_key().to_string(), id_value(parent_id));
        body.insert("enlace".to_string(), Value::from(url));
        self.mutate(owner.create_link_endpoint(), Payload::Json(Value::Object(body)))
            .await
            .map(|_| ())
    }

    // ===== Deletion =====

    pub async fn delete(&self, target: Removable, id: &str) -> Result<()> {
        tracing::info!("Deleting {:?} {}", target, id);
        self.mutate(target.endpoint(), Self::by_id("id", id))
            .await
            .map(|_| ())
    }
}

fn question_body(draft: &QuestionDraft) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("pregunta".to_string(), Value::from(draft.prompt.as_str()));
    for slot in 0..crate::config::MAX_QUIZ_OPTIONS {
        let value = draft
            .options
            .get(slot)
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(Value::from)
            .unwrap_or(Value::Null);
        body.insert(format!("opcion{}", slot + 1), value);
    }
    body.insert("respuesta".to_string(), Value::from(draft.answer.as_str()));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::scripted::ScriptedTransport;

    fn gateway(transport: &Arc<ScriptedTransport>) -> RemoteGateway {
        RemoteGateway::new(transport.clone())
    }

    #[tokio::test]
    async fn test_login_success_and_rejection() {
        let transport = ScriptedTransport::new();
        transport.reply(
            ep::LOGIN,
            r#"{"success":true,"id":"9","rol":"alumno","nombre":"Ana","email":"ana@example.com"}"#,
        );
        let session = gateway(&transport).login("ana@example.com", "pw").await.unwrap();
        assert_eq!(session.user_id, "9");
        assert_eq!(session.display_name, "Ana");

        transport.reply(ep::LOGIN, r#"{"success":false}"#);
        let err = gateway(&transport).login("ana@example.com", "bad").await.unwrap_err();
        assert_eq!(err.to_string(), "Credenciales no válidas");

        match &transport.calls()[0].payload {
            Payload::Form(fields) => assert!(fields.contains(&("pass".to_string(), "pw".to_string()))),
            other => panic!("expected form payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_error() {
        let transport = ScriptedTransport::new();
        transport.reply_status(ep::LIST_TOPICS, 500, "boom");
        let err = gateway(&transport).list_topics("3").await.unwrap_err();
        assert!(matches!(err, AppError::Server(500)));
        assert_eq!(err.to_string(), "Error 500");
    }

    #[tokio::test]
    async fn test_create_task_reads_plain_text_id() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::CREATE_TASK, "57");
        let draft = TaskDraft {
            topic_id: "2".to_string(),
            title: "Ensayo".to_string(),
            description: String::new(),
            points: 10.0,
            due_at: "2025-01-01 10:00:00".to_string(),
        };
        let id = gateway(&transport).create_task("3", &draft).await.unwrap();
        assert_eq!(id.as_deref(), Some("57"));
    }

    #[tokio::test]
    async fn test_create_quiz_reads_json_id() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::CREATE_QUIZ, r#"{"id": 12, "mensaje": "ok"}"#);
        let draft = ContentDraft {
            topic_id: "2".to_string(),
            title: "Repaso".to_string(),
            description: String::new(),
        };
        let id = gateway(&transport).create_quiz("3", &draft).await.unwrap();
        assert_eq!(id.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_questions_are_filtered_by_quiz() {
        let transport = ScriptedTransport::new();
        transport.reply(
            ep::LIST_QUESTIONS,
            r#"[{"id":1,"id_cuestionario":5,"pregunta":"a","respuesta":"x"},
                {"id":2,"id_cuestionario":6,"pregunta":"b","respuesta":"y"}]"#,
        );
        let questions = gateway(&transport).list_questions("5").await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "1");
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_metadata() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::UPLOAD_TASK_FILE, r#"{"status":"ok","message":"subido"}"#);
        gateway(&transport)
            .upload_file(
                AttachmentOwner::Task,
                "8",
                FileUpload::new("a.pdf", "application/pdf", vec![1, 2, 3]),
            )
            .await
            .unwrap();

        match &transport.calls()[0].payload {
            Payload::Multipart { metadata, file } => {
                assert_eq!(metadata, &json!({"id_tareas": 8}));
                assert_eq!(file.file_name, "a.pdf");
            }
            other => panic!("expected multipart payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_upload() {
        let transport = ScriptedTransport::new();
        transport.reply(ep::UPLOAD_MATERIAL_FILE, r#"{"status":"error","message":"sin archivo"}"#);
        let err = gateway(&transport)
            .upload_file(
                AttachmentOwner::Material,
                "1",
                FileUpload::new("a.txt", "text/plain", vec![]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Rejected(ref m) if m == "sin archivo"));
    }

    #[tokio::test]
    async fn test_network_failure_passes_through() {
        let transport = ScriptedTransport::new();
        transport.fail(ep::LIST_TASKS, "timeout");
        let err = gateway(&transport).list_tasks("1").await.unwrap_err();
        assert!(matches!(err, AppError::Network(ref m) if m == "timeout"));
    }
}
