// src/config.rs
use std::{fmt, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};

use crate::replay::MAX_SKEW;

pub const DEFAULT_PORT: u16 = 8080;

/// Shared bootstrap key. Never printed.
#[derive(Clone)]
pub struct BootstrapSecret(Arc<[u8]>);

impl BootstrapSecret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for BootstrapSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BootstrapSecret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub secret: BootstrapSecret,
    /// Enables the freshness and nonce-replay checks when set.
    pub max_skew: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("invalid PORT {p:?}"))?,
            None => DEFAULT_PORT,
        };

        let secret = lookup("BOOTSTRAP_SECRET").context("BOOTSTRAP_SECRET must be set")?;
        if secret.is_empty() {
            bail!("BOOTSTRAP_SECRET must not be empty");
        }

        let max_skew = match lookup("BOOTSTRAP_MAX_SKEW_SECS") {
            Some(s) => {
                let secs: u64 = s
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid BOOTSTRAP_MAX_SKEW_SECS {s:?}"))?;
                if secs == 0 {
                    bail!("BOOTSTRAP_MAX_SKEW_SECS must be positive");
                }
                if secs > MAX_SKEW.as_secs() {
                    bail!(
                        "BOOTSTRAP_MAX_SKEW_SECS must be at most {}",
                        MAX_SKEW.as_secs()
                    );
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            port,
            secret: BootstrapSecret::new(secret.into_bytes()),
            max_skew,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_lookup(lookup(&[("BOOTSTRAP_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.secret.expose(), b"s3cret");
        assert!(cfg.max_skew.is_none());
        assert_eq!(cfg.listen_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn reads_port_and_skew() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("BOOTSTRAP_SECRET", "s3cret"),
            ("BOOTSTRAP_MAX_SKEW_SECS", "300"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.max_skew, Some(Duration::from_secs(300)));
    }

    #[test]
    fn secret_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("BOOTSTRAP_SECRET", "")])).is_err());
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Config::from_lookup(lookup(&[("BOOTSTRAP_SECRET", "s"), ("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("BOOTSTRAP_SECRET", "s"),
            ("BOOTSTRAP_MAX_SKEW_SECS", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn skew_window_has_upper_bound() {
        let day = Config::from_lookup(lookup(&[
            ("BOOTSTRAP_SECRET", "s"),
            ("BOOTSTRAP_MAX_SKEW_SECS", "86400"),
        ]))
        .unwrap();
        assert_eq!(day.max_skew, Some(MAX_SKEW));

        for too_wide in ["86401", "18446744073709551615"] {
            assert!(Config::from_lookup(lookup(&[
                ("BOOTSTRAP_SECRET", "s"),
                ("BOOTSTRAP_MAX_SKEW_SECS", too_wide),
            ]))
            .is_err());
        }
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let cfg = Config::from_lookup(lookup(&[("BOOTSTRAP_SECRET", "hunter2")])).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
