//! HTTP server bootstrap for the Delego broker.
//!
//! This module wires together:
//! - configuration
//! - the in-memory stores and demo collaborators
//! - core services (delegation store, session broker, access verifier,
//!   attestation registry)
//! - the Axum router and the periodic session sweep

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::access::AccessVerifier;
use crate::anchor::{AnchorConfig, AnchorService};
use crate::broker::{AccessSessionBroker, BrokerConfig};
use crate::crypto::IssuerSigningKey;
use crate::infra::{
    DelegationConfig, DelegationStore, InMemoryAttestationStore, InMemoryDelegationStore,
    SeededOwnershipOracle, SingleSlotProfileAllocator, StubLedgerAnchor, StubProofVerifier,
};
use crate::registry::{AttestationRegistry, RegistryConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Allowed CORS origin, `*` for any.
    pub cors_origin: String,
    /// Delegation duration bounds and oracle timeout.
    pub delegation: DelegationConfig,
    /// Session issuance bounds.
    pub broker: BrokerConfig,
    /// Attestation validity and verifier timeout.
    pub registry: RegistryConfig,
    /// Ledger anchoring timeout and retry policy.
    pub anchor: AnchorConfig,
    /// Interval between periodic session sweeps.
    pub sweep_interval: Duration,
    /// Optional hex-encoded 32-byte issuer key seed; generated if absent.
    pub issuer_seed: Option<[u8; 32]>,
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Clamp to at least one second so a non-positive value can never silently
/// disable the sweep.
fn sweep_interval(secs: i64) -> Duration {
    Duration::from_secs(secs.max(1) as u64)
}

/// Parse a hex-encoded 32-byte issuer seed. A seed that is present but
/// malformed is rejected loudly rather than silently replaced, since a
/// deployment that set one expects a stable issuer key.
fn parse_issuer_seed(raw: &str) -> Option<[u8; 32]> {
    match hex::decode(raw).ok().and_then(|bytes| bytes.try_into().ok()) {
        Some(seed) => Some(seed),
        None => {
            warn!("ISSUER_KEY_SEED is set but is not 32 hex-encoded bytes; generating an ephemeral key");
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .expect("Invalid listen address");

        let mut delegation = DelegationConfig::default();
        delegation.min_duration_secs = env_i64("MIN_DELEGATION_SECS", delegation.min_duration_secs);
        delegation.max_duration_secs = env_i64("MAX_DELEGATION_SECS", delegation.max_duration_secs);

        let mut broker = BrokerConfig::default();
        broker.min_session_secs = env_i64("MIN_SESSION_SECS", broker.min_session_secs);
        broker.max_session_secs = env_i64("MAX_SESSION_SECS", broker.max_session_secs);
        if let Ok(base_url) = std::env::var("ACCESS_BASE_URL") {
            broker.access_base_url = base_url;
        }

        let issuer_seed = std::env::var("ISSUER_KEY_SEED")
            .ok()
            .and_then(|raw| parse_issuer_seed(&raw));

        Self {
            listen_addr,
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            delegation,
            broker,
            registry: RegistryConfig::default(),
            anchor: AnchorConfig::default(),
            sweep_interval: sweep_interval(env_i64("SWEEP_INTERVAL_SECS", 60)),
            issuer_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".parse().expect("static addr"),
            cors_origin: "*".to_string(),
            delegation: DelegationConfig::default(),
            broker: BrokerConfig::default(),
            registry: RegistryConfig::default(),
            anchor: AnchorConfig::default(),
            sweep_interval: Duration::from_secs(60),
            issuer_seed: None,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub delegation_store: Arc<dyn DelegationStore>,
    pub access_verifier: Arc<AccessVerifier>,
    pub session_broker: Arc<AccessSessionBroker>,
    pub attestation_registry: Arc<AttestationRegistry>,
    pub ownership_oracle: Arc<SeededOwnershipOracle>,
}

/// Assemble the full in-memory application stack.
pub fn build_state(config: &Config) -> AppState {
    let oracle = Arc::new(SeededOwnershipOracle::new());
    let delegation_store = Arc::new(InMemoryDelegationStore::new(
        oracle.clone(),
        config.delegation.clone(),
    ));
    let access_verifier = Arc::new(AccessVerifier::new(
        oracle.clone(),
        delegation_store.clone(),
        config.delegation.oracle_timeout,
    ));
    let session_broker = Arc::new(AccessSessionBroker::new(
        delegation_store.clone(),
        oracle.clone(),
        Arc::new(SingleSlotProfileAllocator::new()),
        config.broker.clone(),
    ));
    let issuer = match config.issuer_seed {
        Some(seed) => IssuerSigningKey::from_seed(seed),
        None => IssuerSigningKey::generate(),
    };
    let attestation_registry = Arc::new(AttestationRegistry::new(
        Arc::new(StubProofVerifier::new()),
        AnchorService::new(Arc::new(StubLedgerAnchor::new()), config.anchor.clone()),
        Arc::new(InMemoryAttestationStore::new()),
        issuer,
        config.registry.clone(),
    ));

    AppState {
        delegation_store,
        access_verifier,
        session_broker,
        attestation_registry,
        ownership_oracle: oracle,
    }
}

/// Build the application router with tracing and CORS layers.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::exact(
                cors_origin.parse().expect("Invalid CORS origin"),
            ))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .nest("/api", crate::api::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Spawn the periodic expired-session sweep.
pub fn spawn_sweeper(broker: Arc<AccessSessionBroker>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so boot stays quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = broker.sweep_expired().await {
                warn!(error = %err, "session sweep failed");
            }
        }
    });
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("delego_broker=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Delego broker v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let state = build_state(&config);
    info!(
        issuer_public_key = %state.attestation_registry.issuer_public_key(),
        "attestation issuer key loaded"
    );

    spawn_sweeper(state.session_broker.clone(), config.sweep_interval);

    let app = build_router(state, &config.cors_origin);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
