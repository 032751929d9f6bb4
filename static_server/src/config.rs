use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Where to listen, what to serve, and the optional TLS pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind: (String, u16),
    pub dist: PathBuf,
    pub tls: Option<TlsFiles>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("CONSOLE_BIND").unwrap_or_else(|| "0.0.0.0:8444".into());
        let (host, port) = bind
            .rsplit_once(':')
            .with_context(|| format!("CONSOLE_BIND must be host:port, got {bind:?}"))?;
        let port = port
            .parse()
            .with_context(|| format!("CONSOLE_BIND must be host:port, got {bind:?}"))?;
        let dist = lookup("CONSOLE_DIST")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../frontend/dist"));
        let tls = match (lookup("CONSOLE_TLS_CERT"), lookup("CONSOLE_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsFiles { cert: cert.into(), key: key.into() }),
            (None, None) => None,
            _ => anyhow::bail!("CONSOLE_TLS_CERT and CONSOLE_TLS_KEY must be set together"),
        };
        Ok(Self { bind: (host.to_string(), port), dist, tls })
    }
}
