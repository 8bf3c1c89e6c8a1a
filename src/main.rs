// src/main.rs
mod canon;
mod config;
mod error;
mod replay;
mod token;
mod types;

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use canon::SignedFields;
use config::{BootstrapSecret, Config};
use error::BootstrapError;
use replay::ReplayGuard;
use token::TokenError;
use types::*;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
struct AppState {
    secret: BootstrapSecret,
    replay: Option<Arc<ReplayGuard>>,
    mint: fn() -> Result<String, TokenError>,
}

impl AppState {
    fn new(cfg: &Config) -> Self {
        Self {
            secret: cfg.secret.clone(),
            replay: cfg.max_skew.map(|w| Arc::new(ReplayGuard::new(w))),
            mint: token::gen_device_token,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    match cfg.max_skew {
        Some(w) => info!(window_secs = w.as_secs(), "replay protection enabled"),
        None => warn!("replay protection disabled; timestamps are signed but not checked"),
    }

    let app = router(AppState::new(&cfg));

    let addr = cfg.listen_addr();
    info!("bootstrap issuer listening on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/healthcheck", get(healthcheck))
        .route("/api/v1/bootstrap", post(bootstrap))
        .fallback(not_allowed)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
}

// ---------- API HANDLERS ---------- //

async fn healthcheck() -> &'static str {
    "OK"
}

async fn not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

async fn bootstrap(
    State(st): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BootstrapError> {
    let req: BootstrapReq =
        serde_json::from_slice(&body).map_err(BootstrapError::InvalidPayload)?;
    let ctx = BootstrapContext::from_headers(&headers);

    let fields = SignedFields {
        nonce: &req.nonce,
        device_pubkey: &req.device_pubkey,
        build_id: &ctx.build_id,
        timestamp: &ctx.timestamp,
    };
    if !canon::verify(&st.secret, &fields, &ctx.signature) {
        warn!(build_id = ?ctx.build_id, "bootstrap rejected: bad signature");
        return Err(BootstrapError::Unauthorized);
    }

    if let Some(guard) = &st.replay {
        if let Err(reason) = guard.check(&req.nonce, &ctx.timestamp) {
            warn!(build_id = ?ctx.build_id, reason = reason.as_str(), "bootstrap rejected");
            return Err(BootstrapError::Unauthorized);
        }
    }

    let device_token = (st.mint)()?;
    let body = serde_json::to_vec(&BootstrapRes { device_token })
        .map_err(BootstrapError::EncodingFailed)?;

    info!(build_id = ?ctx.build_id, "device token issued");
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
