//! Class content command
//!
//! Loads the whole class screen at once: every topic is expanded, and
//! announcements load alongside. Failures of single topics are
//! collected rather than aborting the listing.

use crate::app::AppState;
use crate::error::Result;
use crate::models::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TopicContent {
    pub topic: Topic,
    pub tasks: Vec<Task>,
    pub materials: Vec<Material>,
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassContent {
    pub class_id: String,
    pub role: ClassRole,
    pub teacher: Option<String>,
    pub topics: Vec<TopicContent>,
    pub announcements: Vec<Announcement>,
    pub errors: Vec<String>,
}

pub async fn class_content(state: &AppState, class_id: &str) -> Result<ClassContent> {
    let session = state.session_service.require().await?;
    let role = state.classes_service.role_in(&session.user_id, class_id).await?;

    let controller = state.content_controller(&session, class_id, role);
    let board = state.announcement_board(&session, class_id, role);

    let mut errors = Vec::new();

    let owner = state
        .classes_service
        .class_header(class_id)
        .await?
        .and_then(|c| c.owner_id);
    controller.set_class_owner(owner.clone());

    let (refreshed, announcements) = tokio::join!(controller.refresh(), board.load());
    if let Err(e) = refreshed {
        errors.push(e.to_string());
    }
    let announcements = match announcements {
        Ok(list) => list.as_ref().clone(),
        Err(e) => {
            errors.push(e.to_string());
            Vec::new()
        }
    };

    let mut topics = Vec::new();
    for topic in controller.topics().iter() {
        if let Err(e) = controller.expand_topic(&topic.id).await {
            errors.push(e.to_string());
        }
        topics.push(TopicContent {
            topic: topic.clone(),
            tasks: controller.tasks_for_topic(&topic.id),
            materials: controller.materials(&topic.id).as_ref().clone(),
            quizzes: controller.quizzes(&topic.id).as_ref().clone(),
        });
    }

    let teacher = match owner {
        Some(owner) => match state.gateway.user_by_id(&owner).await {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                tracing::warn!("Teacher lookup for class {} failed: {}", class_id, e);
                None
            }
        },
        None => None,
    };

    Ok(ClassContent {
        class_id: class_id.to_string(),
        role,
        teacher,
        topics,
        announcements,
        errors,
    })
}
