//! Domain models
//!
//! Canonical types shared by the services. Field names are fixed here;
//! the many spellings the service uses on the wire are resolved in
//! `remote::wire` and never leak past it.

use serde::{Deserialize, Serialize};

/// The viewer's relationship to the class being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassRole {
    /// Owner of the class
    Teacher,
    Student,
}

impl ClassRole {
    pub fn is_teacher(self) -> bool {
        matches!(self, ClassRole::Teacher)
    }
}

/// Which entity type a generic cache or permission operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Topic,
    Task,
    Material,
    Quiz,
    Question,
    Announcement,
    AttachmentFile,
    AttachmentLink,
    Comment,
    Submission,
}

impl EntityKind {
    /// Class-wide entities only the owning teacher may administer
    pub fn is_administrative(self) -> bool {
        matches!(
            self,
            EntityKind::Topic
                | EntityKind::Task
                | EntityKind::Material
                | EntityKind::Quiz
                | EntityKind::Question
        )
    }

    /// Entities that accept file and link attachments
    pub fn accepts_attachments(self) -> bool {
        matches!(
            self,
            EntityKind::Task | EntityKind::Material | EntityKind::Announcement
        )
    }
}

/// The two attachment families, tracked independently for locking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File,
    Link,
}

/// Logged-in identity, passed explicitly to the services that need it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    /// Account role as reported by the service ("profesor", "alumno", ...)
    pub role: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    pub code: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    /// User id of the teacher, when the payload carries it
    pub owner_id: Option<String>,
}

/// One enrolment row of a class roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Id of the class/student relation, used to expel
    pub relation_id: String,
    pub user_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub class_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub topic_id: String,
    pub class_id: String,
    pub title: String,
    pub description: String,
    pub points: f64,
    /// Due timestamp as sent by the service
    pub due_at: String,
}

/// One entry of a task's submission history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub file_name: Option<String>,
    pub url: String,
    pub submitted_at: Option<String>,
    /// Percentage as text; `None` until graded
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub topic_id: String,
    pub class_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub prompt: String,
    /// Up to four non-blank options, in display order
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    /// Two-decimal percentage, e.g. "66.67"
    pub score: String,
    pub taken_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub id: String,
    /// Task, material or announcement the file hangs from
    pub parent_id: String,
    pub name: String,
    pub url: String,
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub parent_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub class_id: String,
    /// `None` when the payload carries no usable author id
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub message: String,
    pub posted_at: Option<String>,
    pub links: Vec<Link>,
    /// Lock flag declared by the service
    pub server_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub task_id: String,
    pub author_id: String,
    pub text: String,
    pub posted_at: Option<String>,
}

/// A file picked by the user, ready to upload
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// One row of a grade report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRow {
    pub title: String,
    pub date: String,
    pub grade: String,
}

/// Whether an id names a real account: positive when numeric, non-blank otherwise
pub fn is_known_user(user_id: &str) -> bool {
    let id = user_id.trim();
    match id.parse::<i64>() {
        Ok(n) => n > 0,
        Err(_) => !id.is_empty(),
    }
}
