//! Integration tests for the classroom client
//!
//! These tests verify end-to-end functionality including:
//! - Session persistence across restarts
//! - Attachment locks surviving a reopen and cleared on logout
//! - Class content and grade commands against a fake backend

use async_trait::async_trait;
use classroom_client::app::{setup_with_transport, AppState};
use classroom_client::commands;
use classroom_client::config::ClientConfig;
use classroom_client::models::{AttachmentKind, ClassRole, FileUpload};
use classroom_client::remote::endpoints as ep;
use classroom_client::remote::{AttachmentOwner, Payload, RawResponse, Transport};
use classroom_client::services::ContentOwner;
use classroom_client::storage::LockKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Backend double answering each endpoint with a canned body
#[derive(Default)]
struct FakeBackend {
    replies: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reply(&self, endpoint: &str, body: &str) {
        self.replies
            .lock()
            .insert(endpoint.to_string(), body.to_string());
    }

    fn count(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == endpoint).count()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn post(&self, endpoint: &str, _payload: Payload) -> classroom_client::error::Result<RawResponse> {
        self.calls.lock().push(endpoint.to_string());
        Ok(match self.replies.lock().get(endpoint) {
            Some(body) => RawResponse::ok(body.clone()),
            None => RawResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}

fn test_config(dir: &TempDir) -> ClientConfig {
    ClientConfig {
        api_base_url: "http://classroom.test/api/".to_string(),
        data_dir: dir.path().join("data"),
        ..ClientConfig::default()
    }
}

/// Helper to create app state over a fake backend in a temp directory
async fn create_test_app(dir: &TempDir, backend: &Arc<FakeBackend>) -> AppState {
    setup_with_transport(test_config(dir), backend.clone())
        .await
        .unwrap()
}

const TEACHER_LOGIN: &str =
    r#"{"success":true,"id":5,"rol":"profesor","nombre":"Profe Ruiz","email":"ruiz@example.com"}"#;
const STUDENT_LOGIN: &str = r#"{"success":true,"id":9,"rol":"alumno","nombre":"Ana"}"#;

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, TEACHER_LOGIN);

    {
        let state = create_test_app(&dir, &backend).await;
        let session = commands::login(&state, "ruiz@example.com", "pw").await.unwrap();
        assert_eq!(session.user_id, "5");
        assert_eq!(session.display_name, "Profe Ruiz");
    }

    let state = create_test_app(&dir, &backend).await;
    let session = commands::whoami(&state).await.unwrap().unwrap();
    assert_eq!(session.user_id, "5");
    assert_eq!(session.email.as_deref(), Some("ruiz@example.com"));

    commands::logout(&state).await.unwrap();
    assert!(commands::whoami(&state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_locks_survive_reopen_and_logout_clears_them() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, STUDENT_LOGIN);

    let task_link = LockKind::new(AttachmentOwner::Task, AttachmentKind::Link);
    {
        let state = create_test_app(&dir, &backend).await;
        commands::login(&state, "ana@example.com", "pw").await.unwrap();
        state.locks.scope("9", "3").lock(task_link, "12").await.unwrap();
        state.locks.scope("10", "3").lock(task_link, "12").await.unwrap();
    }

    let state = create_test_app(&dir, &backend).await;
    assert!(state.locks.scope("9", "3").is_locked(task_link, "12"));
    assert!(!state.locks.scope("9", "4").is_locked(task_link, "12"));

    commands::logout(&state).await.unwrap();
    assert!(!state.locks.scope("9", "3").is_locked(task_link, "12"));
    assert!(state.locks.scope("10", "3").is_locked(task_link, "12"));
}

#[tokio::test]
async fn test_commands_require_a_session() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    let state = create_test_app(&dir, &backend).await;

    let err = commands::list_classes(&state).await.unwrap_err();
    assert_eq!(err.to_string(), "Sesión inválida");
    assert!(commands::class_grades(&state, "3").await.is_err());
    assert_eq!(backend.count(ep::TAUGHT_CLASSES), 0);
}

#[tokio::test]
async fn test_class_content_for_teacher() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, TEACHER_LOGIN);
    backend.reply(ep::TAUGHT_CLASSES, r#"[{"id_clase":3,"nombre":"Historia","codigo":"HIS-1"}]"#);
    backend.reply(ep::CLASS_BY_ID, r#"[{"id_clase":3,"nombre":"Historia","id_usuario":5}]"#);
    backend.reply(ep::USER_BY_ID, r#"[{"id":5,"nombre":"Profe Ruiz"}]"#);
    backend.reply(ep::LIST_TOPICS, r#"[{"id":1,"titulo":"<b>Roma</b>"}]"#);
    backend.reply(
        ep::LIST_TASKS,
        r#"[{"id":7,"id_tema":1,"titulo":"Ensayo","fecha_entrega":"2025-05-01 23:59:00"},
            {"id":8,"id_tema":2,"titulo":"Otro tema"}]"#,
    );
    backend.reply(ep::LIST_MATERIALS, r#"[{"id":4,"titulo":"Lecturas"}]"#);
    backend.reply(ep::LIST_QUIZZES, r#"[{"id":6,"titulo":"Repaso"}]"#);
    backend.reply(
        ep::LIST_ANNOUNCEMENTS,
        r#"[{"id":2,"id_usuario":5,"nombre":"Profe Ruiz","mensaje":"Bienvenidos","bloqueado":0,"enlaces":[]}]"#,
    );

    let state = create_test_app(&dir, &backend).await;
    commands::login(&state, "ruiz@example.com", "pw").await.unwrap();

    let content = commands::class_content(&state, "3").await.unwrap();
    assert_eq!(content.role, ClassRole::Teacher);
    assert_eq!(content.teacher.as_deref(), Some("Profe Ruiz"));
    assert!(content.errors.is_empty(), "{:?}", content.errors);

    assert_eq!(content.topics.len(), 1);
    let roma = &content.topics[0];
    assert_eq!(roma.topic.title, "Roma");
    assert_eq!(roma.tasks.len(), 1);
    assert_eq!(roma.tasks[0].title, "Ensayo");
    assert_eq!(roma.materials[0].title, "Lecturas");
    assert_eq!(roma.quizzes[0].title, "Repaso");
    assert_eq!(content.announcements[0].message, "Bienvenidos");
}

#[tokio::test]
async fn test_class_content_collects_partial_failures() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, STUDENT_LOGIN);
    backend.reply(ep::TAUGHT_CLASSES, "[]");
    backend.reply(ep::CLASS_BY_ID, "[]");
    backend.reply(ep::LIST_TOPICS, r#"[{"id":1,"titulo":"Roma"}]"#);
    backend.reply(ep::LIST_TASKS, "[]");
    backend.reply(ep::LIST_QUIZZES, "[]");
    backend.reply(ep::LIST_ANNOUNCEMENTS, "[]");

    let state = create_test_app(&dir, &backend).await;
    commands::login(&state, "ana@example.com", "pw").await.unwrap();

    let content = commands::class_content(&state, "3").await.unwrap();
    assert_eq!(content.role, ClassRole::Student);
    assert!(content.teacher.is_none());
    assert_eq!(content.topics.len(), 1);
    assert!(content.topics[0].materials.is_empty());
    assert_eq!(content.errors, vec!["Error 404".to_string()]);
}

#[tokio::test]
async fn test_grade_report_command() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, STUDENT_LOGIN);
    backend.reply(ep::LIST_TASKS, r#"[{"id":1,"titulo":"Beta"},{"id":2,"titulo":"Alpha"}]"#);
    backend.reply(
        ep::LIST_SUBMISSIONS,
        r#"[{"id":1,"id_usuario":9,"fecha":"2025-01-01 10:00:00","calificacion":"70"},
            {"id":2,"id_usuario":9,"fecha":"2025-01-02 10:00:00","calificacion":""}]"#,
    );
    backend.reply(ep::LIST_TOPICS, r#"[{"id":1,"titulo":"Roma"}]"#);
    backend.reply(ep::LIST_QUIZZES, r#"[{"id":6,"titulo":"Repaso"}]"#);
    backend.reply(
        ep::LIST_QUIZ_ATTEMPTS,
        r#"[{"id":3,"id_usuario":9,"calificacion":"66.67","fecha":"2025-01-03 09:00:00"}]"#,
    );

    let state = create_test_app(&dir, &backend).await;
    commands::login(&state, "ana@example.com", "pw").await.unwrap();

    let report = commands::class_grades(&state, "3").await.unwrap();
    let titles: Vec<_> = report.tasks.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    assert!(report.tasks.iter().all(|r| r.grade == "-"));
    assert!(report.tasks.iter().all(|r| r.date == "2025-01-02 10:00:00"));
    assert_eq!(report.quizzes.len(), 1);
    assert_eq!(report.quizzes[0].grade, "66.67");
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_attached_file_locks_across_controllers() {
    let dir = TempDir::new().unwrap();
    let backend = FakeBackend::new();
    backend.reply(ep::LOGIN, TEACHER_LOGIN);
    backend.reply(ep::UPLOAD_TASK_FILE, r#"{"success":true}"#);
    backend.reply(ep::LIST_TASK_FILES, "[]");

    let state = create_test_app(&dir, &backend).await;
    let session = commands::login(&state, "ruiz@example.com", "pw").await.unwrap();

    let first = state.content_controller(&session, "3", ClassRole::Teacher);
    first
        .attach_file(
            ContentOwner::Task,
            "7",
            FileUpload::new("ensayo.pdf", "application/pdf", vec![1, 2, 3]),
        )
        .await
        .unwrap();

    let task_file = LockKind::new(AttachmentOwner::Task, AttachmentKind::File);
    assert!(state.locks.scope("5", "3").is_locked(task_file, "7"));

    let second = state.content_controller(&session, "3", ClassRole::Teacher);
    let err = second
        .attach_file(
            ContentOwner::Task,
            "7",
            FileUpload::new("otro.pdf", "application/pdf", vec![4]),
        )
        .await
        .unwrap_err();
    assert!(err.is_client_side());
    assert_eq!(backend.count(ep::UPLOAD_TASK_FILE), 1);
}
