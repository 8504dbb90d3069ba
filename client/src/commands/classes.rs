//! Class list commands

use crate::app::AppState;
use crate::error::Result;
use crate::models::ClassInfo;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ClassList {
    pub taught: Vec<ClassInfo>,
    pub enrolled: Vec<ClassInfo>,
}

/// Classes the logged-in user teaches and attends
pub async fn list_classes(state: &AppState) -> Result<ClassList> {
    let session = state.session_service.require().await?;
    let classes = &state.classes_service;

    let (taught, enrolled) = tokio::join!(
        classes.taught_classes(&session.user_id),
        classes.enrolled_classes(&session.user_id)
    );

    Ok(ClassList {
        taught: taught?.as_ref().clone(),
        enrolled: enrolled?.as_ref().clone(),
    })
}
