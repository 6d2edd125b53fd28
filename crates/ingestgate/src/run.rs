//! Builds the gateway's components from [`Config`] and runs the external
//! and internal listeners as sibling tasks that start and stop together
//! (§5).

use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use ingestgate_authz::{CachingAuthorizer, ClusterAuthorizer, HttpAuthorizer, StubAuthorizer};
use ingestgate_axum::{AppState, ExternalOptions};
use ingestgate_pipeline::{Forwarder, RateLimiter};
use ingestgate_pipeline::transform::{AllowListRule, TransformConfig};
use ingestgate_token::TokenIssuer;
use ingestgate_types::metrics::GatewayMetrics;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, TlsConfig, V2_LIMIT_BYTES};
use crate::internal::{self, InternalState};
use crate::shutdown::SigDown;

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new();
    let metrics = GatewayMetrics::register(&registry)?;

    let token_issuer = Arc::new(TokenIssuer::new(
        config.shared_key.as_deref(),
        "telemeter.selfsigned",
        "telemeter-client",
        config.token_expire_seconds,
    )?);

    let authorizer = build_authorizer(&config, metrics.clone())?;

    let mut allow_list = Vec::new();
    for rule in &config.whitelist {
        match AllowListRule::parse(rule) {
            Some(parsed) => allow_list.push(parsed),
            None => tracing::warn!(rule, "ignoring unparsable whitelist rule"),
        }
    }
    let transform = Arc::new(TransformConfig {
        allow_list,
        added_labels: config.added_labels.clone(),
        elide_labels: config.elide_labels.clone(),
    });

    let rate_limiter = Arc::new(RateLimiter::new(Duration::from_secs(config.ratelimit_secs)));
    let forwarder = Arc::new(Forwarder::new(config.forward_url.clone(), metrics.clone()));

    let options = ExternalOptions {
        partition_label: config.partition_label.clone(),
        tenant_key: config.tenant_key.clone(),
        required_labels: config.required_labels.clone(),
        v1_limit_bytes: config.limit_bytes,
        v2_limit_bytes: V2_LIMIT_BYTES,
    };

    let state = AppState {
        token_issuer,
        authorizer,
        transform,
        rate_limiter,
        forwarder,
        metrics,
        options,
    };

    let external_router = ingestgate_axum::router(state);
    let internal_state = InternalState::new(registry);
    let internal_router = internal::router(internal_state);

    let sig_down = SigDown::try_new()?;
    let token = sig_down.cancellation_token();

    let mut external = Box::pin(serve(config.listen, config.tls, external_router, token.clone()));
    let mut internal = Box::pin(serve(
        config.listen_internal,
        config.internal_tls,
        internal_router,
        token.clone(),
    ));

    tracing::info!(external = %config.listen, internal = %config.listen_internal, "starting ingestgate");

    // The two listeners are sibling tasks that start and stop together
    // (§5): whichever exits first — cleanly or not — cancels the token so
    // the other winds down instead of serving alone.
    let (first, second) = tokio::select! {
        result = &mut external => {
            token.cancel();
            (result, internal.await)
        }
        result = &mut internal => {
            token.cancel();
            (result, external.await)
        }
    };
    first?;
    second?;
    Ok(())
}

fn build_authorizer(
    config: &Config,
    metrics: GatewayMetrics,
) -> Result<Arc<dyn ClusterAuthorizer>, Box<dyn std::error::Error>> {
    let inner: Box<dyn ClusterAuthorizer> = match &config.authorize {
        Some(url) => {
            let oidc = match &config.oidc {
                Some(oidc) => Some(ingestgate_authz::oidc::OidcTokenSource::new(
                    &oidc.issuer,
                    oidc.client_id.clone(),
                    oidc.client_secret.clone(),
                )?),
                None => None,
            };
            Box::new(HttpAuthorizer::new(url.clone(), oidc)?)
        }
        None => Box::new(StubAuthorizer),
    };

    let backend: Box<dyn ingestgate_authz::cache::backend::CacheBackend> = if config.memcached.is_empty() {
        Box::new(ingestgate_authz::cache::backend::InProcessBackend::new())
    } else {
        Box::new(ingestgate_authz::cache::backend::MemcachedBackend::new(
            config.memcached.clone(),
            Duration::from_secs(config.memcached_interval_secs),
        )?)
    };

    let ttl = Duration::from_secs(config.memcached_expire_secs);
    Ok(Arc::new(CachingAuthorizer::new(inner, backend, ttl, metrics)))
}

async fn serve(
    addr: std::net::SocketAddr,
    tls: Option<TlsConfig>,
    router: axum::Router,
    token: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let make_service = router.into_make_service();
    match tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(tls.crt, tls.key).await?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(make_service)
                .await?;
        }
        None => {
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });
            axum_server::bind(addr)
                .handle(handle)
                .serve(make_service)
                .await?;
        }
    }
    Ok(())
}
