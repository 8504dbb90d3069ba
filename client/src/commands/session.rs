//! Session commands

use crate::app::AppState;
use crate::error::Result;
use crate::models::Session;

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<Session> {
    state.session_service.login(email, password).await
}

pub async fn logout(state: &AppState) -> Result<()> {
    state.session_service.logout().await
}

/// The stored session, if any
pub async fn whoami(state: &AppState) -> Result<Option<Session>> {
    state.session_service.current().await
}
