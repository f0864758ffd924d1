//! Process wiring: config → state → router → serve.
//!
//! Responsibility:
//! - tracing and panic-hook initialization
//! - building the shared state (policy engine load is fatal here)
//! - middleware ordering: request-id/trace outermost, then authorization,
//!   so the span is open before any decision is made
//! - policy reload on interval and SIGHUP

use std::panic;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::TokenVerifier;
use crate::services::policy::PolicyEngine;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex: RUST_LOG=info,gateway_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing so they don't get lost when stderr is
        // hidden by the process supervisor.
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving other requests.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    let state = build_state(&config)?;
    spawn_policy_reload(state.policy.clone(), &config);

    let app = build_router(state, &config);

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    // An unloadable policy at startup is fatal: the gateway must not serve
    // a single request without an enforceable rule set.
    let policy = PolicyEngine::from_files(&config.policy_model_path, &config.policy_grants_path)
        .context("loading policy resources")?;

    let grant_count = policy.grant_count()?;
    tracing::info!(grants = grant_count, "policy loaded");

    let verifier = TokenVerifier::new(
        &config.auth_token_secret,
        &config.auth_issuer,
        &config.auth_audience,
        config.auth_leeway_seconds,
    );

    Ok(AppState::new(
        Arc::new(verifier),
        policy,
        &config.unauthenticated_role,
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::routes();
    let router = middleware::auth::apply(router, state.clone());
    let router = router.with_state(state);
    let router = middleware::cors::apply(router, config);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router)
}

fn spawn_policy_reload(policy: PolicyEngine, config: &Config) {
    let model = config.policy_model_path.clone();
    let grants = config.policy_grants_path.clone();

    if config.policy_reload_interval_seconds > 0 {
        let policy = policy.clone();
        let (model, grants) = (model.clone(), grants.clone());
        let period = Duration::from_secs(config.policy_reload_interval_seconds);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; startup already loaded.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                reload(&policy, &model, &grants);
            }
        });
    }

    #[cfg(unix)]
    spawn_sighup_reload(policy, model, grants);
}

#[cfg(unix)]
fn spawn_sighup_reload(policy: PolicyEngine, model: PathBuf, grants: PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(hup) => hup,
            Err(err) => {
                tracing::warn!(error = %err, "SIGHUP handler unavailable; signal reload disabled");
                return;
            }
        };
        while hup.recv().await.is_some() {
            reload(&policy, &model, &grants);
        }
    });
}

fn reload(policy: &PolicyEngine, model: &Path, grants: &Path) {
    match policy.reload_from_files(model, grants) {
        Ok(()) => tracing::info!("policy reloaded"),
        Err(err) => {
            // Previous snapshot stays in effect; requests keep being
            // evaluated against the last-known-good rule set.
            tracing::warn!(error = %err, "policy reload failed");
        }
    }
}
