//! Session service
//!
//! Login, registration and logout. The logged-in identity is stored
//! locally and handed to the other services explicitly.

use crate::database::Repository;
use crate::error::{AppError, Result};
use crate::models::Session;
use crate::remote::RemoteGateway;
use crate::storage::LockStore;

const REGISTRATION_OK: &str = "registro exitoso";

#[derive(Clone)]
pub struct SessionService {
    gateway: RemoteGateway,
    repo: Repository,
    locks: LockStore,
}

impl SessionService {
    pub fn new(gateway: RemoteGateway, repo: Repository, locks: LockStore) -> Self {
        Self {
            gateway,
            repo,
            locks,
        }
    }

    /// Authenticate and persist the session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("Ingresa tu email".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Ingresa tu contraseña".to_string()));
        }

        tracing::info!("Logging in: {}", email);
        let session = self.gateway.login(email, password).await?;
        self.repo.save_session(&session).await?;

        tracing::info!("Logged in as user {} ({})", session.user_id, session.role);
        Ok(session)
    }

    /// Create an account; returns the service's confirmation text
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<String> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Ingresa tu nombre".to_string()));
        }
        if email.is_empty() {
            return Err(AppError::Validation("Ingresa tu email".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Ingresa una contraseña".to_string()));
        }
        if password != confirmation {
            return Err(AppError::Validation("Las contraseñas no coinciden".to_string()));
        }

        tracing::info!("Registering account: {}", email);
        let reply = self.gateway.register(name, email, password).await?;

        if reply.to_lowercase().contains(REGISTRATION_OK) {
            Ok(reply)
        } else if reply.is_empty() {
            Err(AppError::Rejected("No se pudo registrar".to_string()))
        } else {
            Err(AppError::Rejected(reply))
        }
    }

    pub async fn current(&self) -> Result<Option<Session>> {
        Ok(self.repo.load_session().await?.map(Session::from))
    }

    /// The stored session, or a validation error when nobody is logged in
    pub async fn require(&self) -> Result<Session> {
        self.current()
            .await?
            .ok_or_else(|| AppError::Validation("Sesión inválida".to_string()))
    }

    /// Forget the session and every attachment lock of that user
    pub async fn logout(&self) -> Result<()> {
        if let Some(session) = self.current().await? {
            tracing::info!("Logging out user {}", session.user_id);
            self.locks.clear_user(&session.user_id).await?;
        }
        self.repo.clear_session().await
    }
}
