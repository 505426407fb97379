use std::time::Duration;

use api::auth::generate_jwt;
use api::state::AppState;
use axum::Router;
use db::test_utils::setup_test_db;
use util::config::AppConfig;
use util::identity::Role;
use util::ws::WsServerOptions;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Fresh in-memory database, hub and session per call.
pub async fn make_test_app() -> (Router, AppState) {
    AppConfig::set_jwt_secret(TEST_JWT_SECRET);

    let db = setup_test_db().await;
    let opts = WsServerOptions {
        ping_interval: Duration::from_secs(54),
        write_timeout: Duration::from_secs(2),
        outbound_capacity: 64,
    };
    let state = AppState::new(db, 64, opts);

    (api::app(state.clone()), state)
}

pub fn token_for(user_id: &str, role: Role) -> String {
    AppConfig::set_jwt_secret(TEST_JWT_SECRET);
    let (token, _) = generate_jwt(user_id, role).expect("failed to sign test token");
    token
}
