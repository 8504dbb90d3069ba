//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::ClientConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::models::{ClassRole, Session};
use crate::remote::{HttpTransport, RemoteGateway, Transport};
use crate::services::{
    AnnouncementBoard, ClassesService, ContentSyncController, GradeAggregator, SessionService,
};
use crate::storage::LockStore;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub gateway: RemoteGateway,
    pub locks: LockStore,
    pub session_service: SessionService,
    pub classes_service: Arc<ClassesService>,
    pub grades: GradeAggregator,
}

impl AppState {
    pub fn new(config: ClientConfig, repo: Repository, locks: LockStore, transport: Arc<dyn Transport>) -> Self {
        let gateway = RemoteGateway::new(transport);

        Self {
            session_service: SessionService::new(gateway.clone(), repo, locks.clone()),
            classes_service: Arc::new(ClassesService::new(gateway.clone())),
            grades: GradeAggregator::new(gateway.clone()),
            config,
            gateway,
            locks,
        }
    }

    /// Content controller for one class screen
    pub fn content_controller(&self, session: &Session, class_id: &str, role: ClassRole) -> ContentSyncController {
        ContentSyncController::new(
            self.gateway.clone(),
            session,
            class_id,
            role,
            self.locks.scope(&session.user_id, class_id),
        )
    }

    /// Announcement board for one class screen
    pub fn announcement_board(&self, session: &Session, class_id: &str, role: ClassRole) -> AnnouncementBoard {
        AnnouncementBoard::new(
            self.gateway.clone(),
            session,
            class_id,
            role,
            self.locks.scope(&session.user_id, class_id),
        )
    }
}

/// Application setup - called once on startup
pub async fn setup(config: ClientConfig) -> Result<AppState> {
    let transport = Arc::new(HttpTransport::new(&config)?);
    setup_with_transport(config, transport).await
}

/// Setup against an arbitrary transport
pub async fn setup_with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = create_pool(&config.database_path()).await?;
    let repo = Repository::new(pool);
    let locks = LockStore::open(repo.clone()).await?;

    let state = AppState::new(config, repo, locks, transport);

    tracing::info!("Application initialized successfully");

    Ok(state)
}
