//! Grade report command

use crate::app::AppState;
use crate::error::Result;
use crate::services::GradeReport;

pub async fn class_grades(state: &AppState, class_id: &str) -> Result<GradeReport> {
    let session = state.session_service.require().await?;
    tracing::info!("Grade report for class {}", class_id);
    Ok(state.grades.report(class_id, &session.user_id).await)
}
