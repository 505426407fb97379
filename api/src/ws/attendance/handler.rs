use std::sync::Arc;

use tracing::{debug, info};
use util::identity::{Identity, Role};
use util::ws::{WsContext, WsHandler};

use super::error::ProtocolError;
use super::events::{ClientEvent, ClientFrame, ServerEvent, required_role};
use super::finalize::finalize;
use super::session::{AttendanceSession, NOT_YET_UPDATED};
use super::store::AttendanceStore;

/// Interprets attendance frames against the caller's role and the shared
/// session. Violations are answered on the caller's own queue only.
pub struct AttendanceHandler {
    session: Arc<AttendanceSession>,
    store: Arc<dyn AttendanceStore>,
}

impl AttendanceHandler {
    pub fn new(session: Arc<AttendanceSession>, store: Arc<dyn AttendanceStore>) -> Self {
        Self { session, store }
    }

    async fn dispatch(
        &self,
        ctx: &WsContext<ServerEvent>,
        frame: ClientFrame,
    ) -> Result<(), ProtocolError> {
        let identity = ctx.identity();
        if let Some(required) = required_role(&frame.event) {
            require_role(identity, required)?;
        }

        match ClientEvent::try_from(frame)? {
            ClientEvent::AttendanceMarked(payload) => {
                self.session.mark(&payload.student_id, payload.status).await?;
                ctx.broadcast(ServerEvent::AttendanceMarked {
                    student_id: payload.student_id,
                    status: payload.status,
                })
                .await;
            }
            ClientEvent::TodaySummary => {
                let summary = self.session.summarize().await?;
                ctx.broadcast(ServerEvent::TodaySummary(summary)).await;
            }
            ClientEvent::MyAttendance => {
                let status = self
                    .session
                    .lookup(&identity.user_id)
                    .await?
                    .map_or(NOT_YET_UPDATED, |s| s.as_str());
                ctx.reply(ServerEvent::MyAttendance {
                    status: status.to_owned(),
                });
            }
            ClientEvent::Done => {
                let outcome = finalize(&self.session, self.store.as_ref()).await?;
                ctx.broadcast(ServerEvent::done(outcome.message(), outcome.summary))
                    .await;
            }
        }
        Ok(())
    }
}

fn require_role(identity: &Identity, required: Role) -> Result<(), ProtocolError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(ProtocolError::RoleViolation { required })
    }
}

impl WsHandler for AttendanceHandler {
    type In = ClientFrame;
    type Out = ServerEvent;

    async fn on_open(&self, ctx: &WsContext<ServerEvent>) {
        info!(
            conn_id = %ctx.connection().id(),
            user_id = %ctx.identity().user_id,
            role = %ctx.identity().role,
            "attendance socket opened"
        );
    }

    async fn on_message(&self, ctx: &WsContext<ServerEvent>, frame: ClientFrame) {
        let event = frame.event.clone();
        if let Err(err) = self.dispatch(ctx, frame).await {
            debug!(
                conn_id = %ctx.connection().id(),
                user_id = %ctx.identity().user_id,
                %event,
                error = %err,
                "attendance event rejected"
            );
            ctx.reply(err.to_event());
        }
    }

    async fn on_malformed(&self, ctx: &WsContext<ServerEvent>, _error: serde_json::Error) {
        ctx.reply(ProtocolError::MalformedInput.to_event());
    }
}
