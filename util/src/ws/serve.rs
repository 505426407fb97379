use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionId, Outbound};
use super::handler_trait::WsHandler;
use super::hub::Hub;
use super::runtime::WsContext;
use crate::identity::Identity;

#[derive(Debug, Clone, Copy)]
pub struct WsServerOptions {
    /// Idle interval between keepalive pings.
    pub ping_interval: Duration,
    /// Deadline for writing a single frame.
    pub write_timeout: Duration,
    /// Capacity of the connection's outbound queue.
    pub outbound_capacity: usize,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(54),
            write_timeout: Duration::from_secs(10),
            outbound_capacity: 256,
        }
    }
}

impl WsServerOptions {
    pub fn from_config(cfg: &crate::config::AppConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(cfg.ws_ping_seconds.max(1)),
            write_timeout: Duration::from_secs(cfg.ws_write_timeout_seconds.max(1)),
            outbound_capacity: cfg.ws_outbound_capacity,
        }
    }
}

/// Runs one connection to completion.
///
/// Registers the connection, runs the write loop as its own task and the read
/// loop on the calling task. When the read loop ends (peer close, transport
/// error, or the write loop giving up) the outbound queue is closed, the
/// socket is shut down, and only then is the connection unregistered.
pub async fn serve_connection<H>(
    socket: WebSocket,
    hub: Hub<H::Out>,
    identity: Identity,
    handler: Arc<H>,
    opts: WsServerOptions,
) where
    H: WsHandler,
{
    let (conn, outbound) = Connection::new(identity, opts.outbound_capacity);
    let (sink, stream) = socket.split();

    hub.register(Arc::clone(&conn)).await;

    let mut writer = tokio::spawn(write_loop(sink, outbound, conn.id(), opts));

    let ctx = WsContext::new(Arc::clone(&conn), hub.clone());
    handler.on_open(&ctx).await;

    tokio::select! {
        _ = read_loop(stream, &ctx, handler.as_ref()) => {}
        _ = &mut writer => {
            debug!(conn_id = %conn.id(), "write loop ended first");
        }
    }

    handler.on_close(&ctx).await;

    // Closing the queue lets the writer drain, send a close frame and exit.
    conn.close();
    if !writer.is_finished() && time::timeout(opts.write_timeout, &mut writer).await.is_err() {
        writer.abort();
    }

    hub.unregister(Arc::clone(&conn)).await;
    info!(conn_id = %conn.id(), user_id = conn.user_id(), "websocket session ended");
}

async fn read_loop<H>(
    mut stream: SplitStream<WebSocket>,
    ctx: &WsContext<H::Out>,
    handler: &H,
) where
    H: WsHandler,
{
    let conn_id = ctx.connection().id();
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%conn_id, error = %e, "websocket read failed");
                break;
            }
        };

        let parsed = match frame {
            Message::Text(text) => serde_json::from_str::<H::In>(text.as_str()),
            Message::Binary(bytes) => serde_json::from_slice::<H::In>(&bytes),
            Message::Close(_) => {
                debug!(%conn_id, "client sent close frame");
                break;
            }
            // Pings are answered by the transport; pongs need no action.
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match parsed {
            Ok(msg) => handler.on_message(ctx, msg).await,
            Err(e) => {
                warn!(%conn_id, error = %e, "invalid websocket message");
                handler.on_malformed(ctx, e).await;
            }
        }
    }
}

async fn write_loop<M>(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: Outbound<M>,
    conn_id: ConnectionId,
    opts: WsServerOptions,
) where
    M: Serialize + Send + Sync + 'static,
{
    let mut ping = time::interval_at(time::Instant::now() + opts.ping_interval, opts.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(event) = next else {
                    let frame = CloseFrame {
                        code: close_code::NORMAL,
                        reason: Utf8Bytes::from_static("connection closed"),
                    };
                    let _ = time::timeout(opts.write_timeout, sink.send(Message::Close(Some(frame)))).await;
                    break;
                };
                let text = match serde_json::to_string(event.as_ref()) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(%conn_id, error = %e, "failed to serialize outbound event");
                        continue;
                    }
                };
                if !write_frame(&mut sink, Message::Text(text.into()), opts.write_timeout).await {
                    debug!(%conn_id, "write failed; ending write loop");
                    break;
                }
                ping.reset();
            }
            _ = ping.tick() => {
                if !write_frame(&mut sink, Message::Ping(Bytes::new()), opts.write_timeout).await {
                    debug!(%conn_id, "keepalive ping failed; ending write loop");
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

async fn write_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: Message,
    deadline: Duration,
) -> bool {
    matches!(time::timeout(deadline, sink.send(frame)).await, Ok(Ok(())))
}
