//! CLI/env configuration loading (§4.10, §6).
//!
//! `clap`'s derive API with the `env` feature covers the flat options
//! table directly; the only work this module adds on top is parsing the
//! repeatable `k=v` flags into maps, reading `whitelist-file`, and
//! rejecting a lone TLS cert or key flag before any listener binds.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use ingestgate_types::kv::parse_kv_map;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid key=value pair in --{flag}: {source}")]
    InvalidKv {
        flag: &'static str,
        #[source]
        source: ingestgate_types::kv::KvParseError,
    },
    #[error("could not read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read signing key {path}: {source}")]
    UnreadableKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("--{crt_flag} and --{key_flag} must both be set or both be omitted")]
    IncompleteTls {
        crt_flag: &'static str,
        key_flag: &'static str,
    },
}

#[derive(Parser, Debug)]
#[command(name = "ingestgate")]
#[command(about = "Authenticating ingestion gateway for federated Prometheus remote-write pushes")]
struct CliArgs {
    /// External TCP bind address.
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Internal TCP bind address (`/healthz`, `/metrics`).
    #[arg(long, env = "LISTEN_INTERNAL", default_value = "0.0.0.0:8081")]
    listen_internal: SocketAddr,

    #[arg(long, env = "TLS_CRT")]
    tls_crt: Option<PathBuf>,
    #[arg(long, env = "TLS_KEY")]
    tls_key: Option<PathBuf>,
    #[arg(long, env = "INTERNAL_TLS_CRT")]
    internal_tls_crt: Option<PathBuf>,
    #[arg(long, env = "INTERNAL_TLS_KEY")]
    internal_tls_key: Option<PathBuf>,

    /// Path to a PEM/DER private key (PKCS#1 RSA, PKCS#8, or SEC1 EC).
    /// An ephemeral P-256 keypair is generated if omitted.
    #[arg(long, env = "SHARED_KEY")]
    shared_key: Option<PathBuf>,

    #[arg(long, env = "TOKEN_EXPIRE_SECONDS", default_value_t = 86_400)]
    token_expire_seconds: u64,

    /// Upstream authorization URL; empty degrades C2 to an accept-all stub.
    #[arg(long, env = "AUTHORIZE")]
    authorize: Option<Url>,

    #[arg(long, env = "OIDC_ISSUER")]
    oidc_issuer: Option<Url>,
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,
    #[arg(long, env = "CLIENT_SECRET")]
    client_secret: Option<String>,

    /// JSON key in the v2 bearer payload whose value is the tenant ID.
    #[arg(long, env = "TENANT_KEY", default_value = "cluster")]
    tenant_key: String,

    /// Memcached server addresses (repeatable). Empty falls back to C3's
    /// in-process cache.
    #[arg(long = "memcached", env = "MEMCACHED", value_delimiter = ',')]
    memcached: Vec<String>,
    #[arg(long, env = "MEMCACHED_EXPIRE", default_value_t = 86_400)]
    memcached_expire: u64,
    #[arg(long, env = "MEMCACHED_INTERVAL", default_value_t = 0)]
    memcached_interval: u64,

    #[arg(long, env = "PARTITION_LABEL", default_value = "_id")]
    partition_label: String,

    #[arg(long = "label", value_name = "k=v")]
    label: Vec<String>,
    #[arg(long = "required-label", value_name = "k=v")]
    required_label: Vec<String>,
    #[arg(long = "elide-label", value_name = "name")]
    elide_label: Vec<String>,

    #[arg(long = "whitelist", value_name = "rule")]
    whitelist: Vec<String>,
    #[arg(long, env = "WHITELIST_FILE")]
    whitelist_file: Option<PathBuf>,

    /// v1 `/upload` body limit, in bytes.
    #[arg(long, env = "LIMIT_BYTES", default_value_t = 500 * 1024)]
    limit_bytes: usize,

    /// Minimum interval between accepted batches per cluster, in seconds.
    #[arg(long, env = "RATELIMIT_SECONDS", default_value_t = 270)]
    ratelimit: u64,

    #[arg(long, env = "FORWARD_URL")]
    forward_url: Url,

    /// `RUST_LOG`-style filter override for the tracing subscriber.
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

/// The v2 push body's fixed, non-configurable size limit (§4.6).
pub const V2_LIMIT_BYTES: usize = 15 * 1024;

pub struct Config {
    pub listen: SocketAddr,
    pub listen_internal: SocketAddr,
    pub tls: Option<TlsConfig>,
    pub internal_tls: Option<TlsConfig>,
    pub shared_key: Option<Vec<u8>>,
    pub token_expire_seconds: u64,
    pub authorize: Option<Url>,
    pub oidc: Option<OidcConfig>,
    pub tenant_key: String,
    pub memcached: Vec<String>,
    pub memcached_expire_secs: u64,
    pub memcached_interval_secs: u64,
    pub partition_label: String,
    pub added_labels: HashMap<String, String>,
    pub required_labels: HashMap<String, String>,
    pub elide_labels: HashSet<String>,
    pub whitelist: Vec<String>,
    pub limit_bytes: usize,
    pub ratelimit_secs: u64,
    pub forward_url: Url,
    pub log_level: Option<String>,
}

pub struct TlsConfig {
    pub crt: PathBuf,
    pub key: PathBuf,
}

pub struct OidcConfig {
    pub issuer: Url,
    pub client_id: String,
    pub client_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let tls = tls_pair(args.tls_crt, args.tls_key, "tls-crt", "tls-key")?;
        let internal_tls = tls_pair(
            args.internal_tls_crt,
            args.internal_tls_key,
            "internal-tls-crt",
            "internal-tls-key",
        )?;

        let shared_key = args
            .shared_key
            .map(|path| {
                fs::read(&path).map_err(|source| ConfigError::UnreadableKey { path, source })
            })
            .transpose()?;

        let oidc = match (args.oidc_issuer, args.client_id, args.client_secret) {
            (Some(issuer), Some(client_id), Some(client_secret)) => Some(OidcConfig {
                issuer,
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let added_labels = parse_kv_map(&args.label)
            .map_err(|source| ConfigError::InvalidKv { flag: "label", source })?;
        let required_labels = parse_kv_map(&args.required_label)
            .map_err(|source| ConfigError::InvalidKv { flag: "required-label", source })?;

        let mut whitelist = args.whitelist;
        if let Some(path) = &args.whitelist_file {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::UnreadableFile {
                path: path.clone(),
                source,
            })?;
            whitelist.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        Ok(Config {
            listen: args.listen,
            listen_internal: args.listen_internal,
            tls,
            internal_tls,
            shared_key,
            token_expire_seconds: args.token_expire_seconds,
            authorize: args.authorize,
            oidc,
            tenant_key: args.tenant_key,
            memcached: args.memcached,
            memcached_expire_secs: args.memcached_expire,
            memcached_interval_secs: args.memcached_interval,
            partition_label: args.partition_label,
            added_labels,
            required_labels,
            elide_labels: args.elide_label.into_iter().collect(),
            whitelist,
            limit_bytes: args.limit_bytes,
            ratelimit_secs: args.ratelimit,
            forward_url: args.forward_url,
            log_level: args.log_level,
        })
    }
}

fn tls_pair(
    crt: Option<PathBuf>,
    key: Option<PathBuf>,
    crt_flag: &'static str,
    key_flag: &'static str,
) -> Result<Option<TlsConfig>, ConfigError> {
    match (crt, key) {
        (Some(crt), Some(key)) => Ok(Some(TlsConfig { crt, key })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::IncompleteTls { crt_flag, key_flag }),
    }
}
