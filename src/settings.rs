//! Runtime settings from the environment (`V2API_*`), plus tracing setup.

use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Directory holding `<name>.json` spec documents. From env `V2API_SPEC_DIR`, default `specs`.
pub const SPEC_DIR_ENV: &str = "V2API_SPEC_DIR";
/// Listen address. From env `V2API_BIND`, default `127.0.0.1:8983`.
pub const BIND_ENV: &str = "V2API_BIND";
/// Maximum request body size in bytes. From env `V2API_BODY_LIMIT`, default 1 MiB.
pub const BODY_LIMIT_ENV: &str = "V2API_BODY_LIMIT";

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub spec_dir: PathBuf,
    pub bind_addr: String,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spec_dir: PathBuf::from("specs"),
            bind_addr: "127.0.0.1:8983".into(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            spec_dir: lookup(SPEC_DIR_ENV).map(PathBuf::from).unwrap_or(defaults.spec_dir),
            bind_addr: lookup(BIND_ENV).unwrap_or(defaults.bind_addr),
            body_limit: parse_or(lookup(BODY_LIMIT_ENV), BODY_LIMIT_ENV, defaults.body_limit),
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = %key, value = %raw, "invalid setting, using default");
            default
        }),
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(settings(&[]), Settings::default());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let s = settings(&[(SPEC_DIR_ENV, "/etc/v2"), (BIND_ENV, "0.0.0.0:9000"), (BODY_LIMIT_ENV, "2048")]);
        assert_eq!(s.spec_dir, PathBuf::from("/etc/v2"));
        assert_eq!(s.bind_addr, "0.0.0.0:9000");
        assert_eq!(s.body_limit, 2048);
    }

    #[test]
    fn invalid_body_limit_falls_back_to_default() {
        assert_eq!(settings(&[(BODY_LIMIT_ENV, "lots")]).body_limit, DEFAULT_BODY_LIMIT);
    }
}
