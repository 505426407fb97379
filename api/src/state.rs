use std::sync::Arc;

use sea_orm::DatabaseConnection;
use util::ws::{Hub, WsServerOptions};

use crate::ws::attendance::{AttendanceHandler, AttendanceSession, AttendanceStore, DbAttendanceStore, ServerEvent};

/// Shared handles for every route and socket. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    hub: Hub<ServerEvent>,
    session: Arc<AttendanceSession>,
    store: Arc<dyn AttendanceStore>,
    handler: Arc<AttendanceHandler>,
    ws_options: WsServerOptions,
}

impl AppState {
    /// Builds the state around the sea-orm backed store. Must be called from
    /// within a Tokio runtime since it spawns the hub.
    pub fn new(db: DatabaseConnection, hub_capacity: usize, ws_options: WsServerOptions) -> Self {
        let store = Arc::new(DbAttendanceStore::new(db.clone()));
        Self::with_store(db, store, hub_capacity, ws_options)
    }

    pub fn with_store(
        db: DatabaseConnection,
        store: Arc<dyn AttendanceStore>,
        hub_capacity: usize,
        ws_options: WsServerOptions,
    ) -> Self {
        let session = Arc::new(AttendanceSession::new());
        let handler = Arc::new(AttendanceHandler::new(session.clone(), store.clone()));
        Self {
            db,
            hub: Hub::spawn(hub_capacity),
            session,
            store,
            handler,
            ws_options,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn hub(&self) -> &Hub<ServerEvent> {
        &self.hub
    }

    pub fn session(&self) -> &Arc<AttendanceSession> {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn AttendanceStore> {
        &self.store
    }

    pub fn attendance_handler(&self) -> Arc<AttendanceHandler> {
        self.handler.clone()
    }

    pub fn ws_options(&self) -> WsServerOptions {
        self.ws_options
    }
}
