//! Centralized configuration for the registry watcher.
//!
//! Sources, in precedence order:
//! - built-in defaults,
//! - optional JSON config file (`--config path.json`),
//! - `RW_*` environment variables.
//!
//! ENV:
//!   RW_REGISTRY_HOST       — registry host (default "localhost")
//!   RW_REGISTRY_PORT       — registry port (default 9229)
//!   RW_CONNECT_TIMEOUT_MS  — connect timeout in ms (default 15000)
//!   RW_READ_TIMEOUT_MS     — read timeout in ms (default 15000)
//!   RW_LOCAL_PATH          — snapshot directory (default ".")
//!   RW_NOTIFY_RECIPIENT    — notification recipient address
//!   RW_NOTIFY_SENDER       — notification sender address
//!   RW_NOTIFY_SUBJECT      — mail subject
//!   RW_DIFF_STYLE          — "UNIFIED" | "HTML" (strict; bad value is a hard error)
//!   RW_SMTP_RELAY          — SMTP relay host (default "localhost")
//!   RW_SMTP_PORT           — SMTP relay port (default 25)

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::diff::DiffStyle;

/// Full configuration for one watcher run. Immutable once loaded.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Name or address of the registry host to fetch snapshots from.
    pub registry_host: String,

    /// Port listened on by the registry service.
    pub registry_port: u16,

    /// Timeout in milliseconds to establish the connection.
    pub connect_timeout_ms: u64,

    /// Timeout in milliseconds to read data after the connection is up.
    pub read_timeout_ms: u64,

    /// Directory within the local filesystem to store snapshots at.
    pub local_path: String,

    /// Address to send notifications to.
    pub notification_recipient: String,

    /// Address identifying the sender.
    pub notification_sender: String,

    /// Subject of the notification mail.
    pub notification_subject: String,

    /// Rendering style of the snapshot difference attachment.
    pub diff_style: DiffStyle,

    /// SMTP relay the notifier hands messages to.
    pub smtp_relay: String,

    /// SMTP relay port.
    pub smtp_port: u16,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            registry_host: "localhost".to_string(),
            registry_port: 9229,
            connect_timeout_ms: 15_000,
            read_timeout_ms: 15_000,
            local_path: ".".to_string(),
            notification_recipient: String::new(),
            notification_sender: String::new(),
            notification_subject: "Registry watcher notification".to_string(),
            diff_style: DiffStyle::Unified,
            smtp_relay: "localhost".to_string(),
            smtp_port: 25,
        }
    }
}

impl WatcherConfig {
    /// Load configuration: defaults, then the JSON file (if given), then ENV.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut cfg = match file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read config file {}", path.display()))?;
                serde_json::from_str::<Self>(&text)
                    .with_context(|| format!("parse config file {}", path.display()))?
            }
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Apply `RW_*` environment overrides on top of the current values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an injected lookup
    /// (used by tests to avoid touching process environment).
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = get("RW_REGISTRY_HOST") {
            let s = v.trim();
            if !s.is_empty() {
                self.registry_host = s.to_string();
            }
        }
        if let Some(v) = get("RW_REGISTRY_PORT") {
            self.registry_port = v
                .trim()
                .parse()
                .map_err(|_| anyhow!("RW_REGISTRY_PORT: invalid port '{v}'"))?;
        }
        if let Some(v) = get("RW_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = v
                .trim()
                .parse()
                .map_err(|_| anyhow!("RW_CONNECT_TIMEOUT_MS: invalid value '{v}'"))?;
        }
        if let Some(v) = get("RW_READ_TIMEOUT_MS") {
            self.read_timeout_ms = v
                .trim()
                .parse()
                .map_err(|_| anyhow!("RW_READ_TIMEOUT_MS: invalid value '{v}'"))?;
        }
        if let Some(v) = get("RW_LOCAL_PATH") {
            let s = v.trim();
            if !s.is_empty() {
                self.local_path = s.to_string();
            }
        }
        if let Some(v) = get("RW_NOTIFY_RECIPIENT") {
            self.notification_recipient = v.trim().to_string();
        }
        if let Some(v) = get("RW_NOTIFY_SENDER") {
            self.notification_sender = v.trim().to_string();
        }
        if let Some(v) = get("RW_NOTIFY_SUBJECT") {
            self.notification_subject = v;
        }
        if let Some(v) = get("RW_DIFF_STYLE") {
            // Strict by design: an unsupported style must fail at load time,
            // never at diff time.
            self.diff_style = v.trim().parse().map_err(|e| anyhow!("RW_DIFF_STYLE: {e}"))?;
        }
        if let Some(v) = get("RW_SMTP_RELAY") {
            let s = v.trim();
            if !s.is_empty() {
                self.smtp_relay = s.to_string();
            }
        }
        if let Some(v) = get("RW_SMTP_PORT") {
            self.smtp_port = v
                .trim()
                .parse()
                .map_err(|_| anyhow!("RW_SMTP_PORT: invalid port '{v}'"))?;
        }
        Ok(())
    }

    /// "host:port" of the registry, as used in notification messages.
    pub fn registry_address(&self) -> String {
        format!("{}:{}", self.registry_host, self.registry_port)
    }

    // ---- builder-style helpers (tests / embedding) ----

    pub fn with_registry(mut self, host: &str, port: u16) -> Self {
        self.registry_host = host.to_string();
        self.registry_port = port;
        self
    }

    pub fn with_local_path(mut self, path: &str) -> Self {
        self.local_path = path.to_string();
        self
    }

    pub fn with_diff_style(mut self, style: DiffStyle) -> Self {
        self.diff_style = style;
        self
    }

    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn defaults() {
        let cfg = WatcherConfig::default();
        assert_eq!(cfg.registry_address(), "localhost:9229");
        assert_eq!(cfg.connect_timeout_ms, 15_000);
        assert_eq!(cfg.diff_style, DiffStyle::Unified);
        assert_eq!(cfg.smtp_port, 25);
    }

    #[test]
    fn env_overrides() -> Result<()> {
        let mut cfg = WatcherConfig::default();
        let env: HashMap<&str, &str> = [
            ("RW_REGISTRY_HOST", "registry.internal"),
            ("RW_REGISTRY_PORT", "9339"),
            ("RW_DIFF_STYLE", "html"),
            ("RW_NOTIFY_RECIPIENT", "ops@example.org"),
        ]
        .into_iter()
        .collect();
        cfg.apply_env_from(lookup(&env))?;
        assert_eq!(cfg.registry_address(), "registry.internal:9339");
        assert_eq!(cfg.diff_style, DiffStyle::Html);
        assert_eq!(cfg.notification_recipient, "ops@example.org");
        Ok(())
    }

    #[test]
    fn bad_diff_style_is_rejected() {
        let mut cfg = WatcherConfig::default();
        let env: HashMap<&str, &str> = [("RW_DIFF_STYLE", "sidebyside")].into_iter().collect();
        assert!(cfg.apply_env_from(lookup(&env)).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut cfg = WatcherConfig::default();
        let env: HashMap<&str, &str> = [("RW_REGISTRY_PORT", "not-a-port")].into_iter().collect();
        assert!(cfg.apply_env_from(lookup(&env)).is_err());
    }

    #[test]
    fn json_config_round() -> Result<()> {
        let text = r#"{
            "registry_host": "reg.lan",
            "registry_port": 7000,
            "diff_style": "HTML",
            "notification_sender": "watcher@example.org"
        }"#;
        let cfg: WatcherConfig = serde_json::from_str(text)?;
        assert_eq!(cfg.registry_address(), "reg.lan:7000");
        assert_eq!(cfg.diff_style, DiffStyle::Html);
        // untouched fields keep defaults
        assert_eq!(cfg.read_timeout_ms, 15_000);
        Ok(())
    }
}
