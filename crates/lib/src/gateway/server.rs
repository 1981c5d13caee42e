//! Gateway HTTP server: routes, the shared dispatch pipeline, and the
//! idempotent start/stop lifecycle.

use crate::channels::{self, ChannelDirectory, DiscordApi, MessagePoster};
use crate::config::{self, Config};
use crate::gateway::error::ApiError;
use crate::gateway::markup::ParseMode;
use crate::gateway::protocol::{
    MessageCreated, SendMessageForm, SendRequest, WebhookDescriptor, WebhookPayload,
};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Channel cache maintained by the bot session; handlers only read.
    pub directory: Arc<ChannelDirectory>,
    /// Backend post-message capability.
    pub poster: Arc<dyn MessagePoster>,
    /// Markup mode for the raw-text route.
    pub markup_mode: ParseMode,
}

/// Path segment constrained to decimal digits. Non-matching segments are
/// rejected with an empty 404 before any handler logic runs, standing in
/// for a digits-only route pattern.
pub struct ChannelId(pub u64);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for ChannelId
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::NOT_FOUND)?;
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StatusCode::NOT_FOUND);
        }
        raw.parse().map(ChannelId).map_err(|_| StatusCode::NOT_FOUND)
    }
}

/// Build the router over the shared state.
fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/healthcheck", get(health_check))
        .route("/api/send_message/:channel_id", post(send_message_text))
        .route("/api/send_message", post(send_message_form))
        .route(
            "/api/webhooks/:channel_id",
            get(get_webhook).post(send_message_webhook),
        )
        .with_state(state)
}

/// GET /hello — liveness text probe.
async fn hello() -> &'static str {
    "Hello, world!\n"
}

/// GET /healthcheck — liveness probe.
async fn health_check() -> &'static str {
    "OK"
}

/// Resolve, dispatch, respond. Every dispatch-reaching route funnels
/// through here: an unresolvable channel never reaches the backend, and a
/// backend failure is classified into `ApiError` in one place.
async fn resolve_and_dispatch(
    state: &GatewayState,
    request: SendRequest,
) -> Result<Json<MessageCreated>, ApiError> {
    let channel = state
        .directory
        .get(request.channel_id)
        .await
        .ok_or(ApiError::NotFound(request.channel_id))?;
    let posted = state
        .poster
        .create_message(channel.id, &request.content, &request.embeds)
        .await?;
    Ok(Json(MessageCreated::from(posted)))
}

/// POST /api/send_message/{channel_id} — raw markup body.
async fn send_message_text(
    State(state): State<GatewayState>,
    ChannelId(channel_id): ChannelId,
    body: String,
) -> Result<Json<MessageCreated>, ApiError> {
    let request = SendRequest::from_text(channel_id, &body, state.markup_mode)?;
    resolve_and_dispatch(&state, request).await
}

/// POST /api/send_message — form fields `content` and `channel_id`.
async fn send_message_form(
    State(state): State<GatewayState>,
    Form(form): Form<SendMessageForm>,
) -> Result<Json<MessageCreated>, ApiError> {
    let request = SendRequest::from_form(form)?;
    resolve_and_dispatch(&state, request).await
}

/// GET /api/webhooks/{channel_id} — synthesized descriptor, or an empty
/// 404 mirroring the emulated API's own not-found convention.
async fn get_webhook(
    State(state): State<GatewayState>,
    ChannelId(channel_id): ChannelId,
) -> Response {
    match state.directory.get(channel_id).await {
        Some(channel) => Json(WebhookDescriptor::for_channel(&channel)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /api/webhooks/{channel_id} — webhook execution payload JSON. The
/// body is parsed from raw bytes so malformed JSON maps to the gateway's
/// own 400 error shape.
async fn send_message_webhook(
    State(state): State<GatewayState>,
    ChannelId(channel_id): ChannelId,
    body: Bytes,
) -> Result<Json<MessageCreated>, ApiError> {
    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("invalid webhook payload: {}", e)))?;
    let request = SendRequest::from_webhook(channel_id, payload)?;
    resolve_and_dispatch(&state, request).await
}

/// Where the listener is in its life. Start is guarded so repeated
/// readiness signals cannot double-bind.
enum Lifecycle {
    NotStarted,
    Running { addr: SocketAddr, task: JoinHandle<()> },
    Stopped,
}

/// HTTP listener with idempotent start/stop, driven by the hosting
/// process's readiness and unload signals.
pub struct ApiServer {
    listen: String,
    port: u16,
    state: GatewayState,
    lifecycle: Mutex<Lifecycle>,
}

impl ApiServer {
    pub fn new(
        config: &Config,
        directory: Arc<ChannelDirectory>,
        poster: Arc<dyn MessagePoster>,
    ) -> Self {
        let markup_mode = if config.api.strict_markup {
            ParseMode::Strict
        } else {
            ParseMode::Tolerant
        };
        Self {
            listen: config.api.listen.clone(),
            port: config.api.port,
            state: GatewayState {
                directory,
                poster,
                markup_mode,
            },
            lifecycle: Mutex::new(Lifecycle::NotStarted),
        }
    }

    /// Bind and start serving if not already running. Returns the bound
    /// address; a second call while running returns the existing one. The
    /// bind completes before this returns, so readiness implies the
    /// socket is accepting.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Lifecycle::Running { addr, .. } = &*lifecycle {
            log::debug!("api server already running on {}", addr);
            return Ok(*addr);
        }
        let bind_addr = format!("{}:{}", self.listen, self.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("binding to {}", bind_addr))?;
        let addr = listener.local_addr().context("reading bound address")?;
        let app = router(self.state.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::warn!("api server exited: {}", e);
            }
        });
        log::info!("api server listening on {}", addr);
        *lifecycle = Lifecycle::Running { addr, task };
        Ok(addr)
    }

    /// Cancel the serve task and release the socket. In-flight requests
    /// are not drained. Idempotent.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Lifecycle::Running { addr, task } =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            task.abort();
            log::info!("api server on {} stopped", addr);
        }
    }
}

/// Load the bot session, seed the channel directory, and serve until
/// SIGINT/SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let token = config::resolve_bot_token(&config)
        .context("discord bot token not configured (set discord.botToken or DISCORD_BOT_TOKEN)")?;
    let api = DiscordApi::new(token, config.discord.api_base.clone());
    let directory = Arc::new(ChannelDirectory::new());
    let count = channels::sync_directory(&api, &directory)
        .await
        .map_err(|e| anyhow::anyhow!("channel directory sync failed: {}", e))?;
    log::info!("channel directory ready with {} channel(s)", count);

    let server = ApiServer::new(&config, directory, Arc::new(api));
    server.start().await?;
    shutdown_signal().await;
    log::info!("shutdown signal received, stopping api server");
    server.stop().await;
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
