//! # Runtime Configuration Module
//!
//! Behaviour toggles forwarded verbatim to the route table when a router is
//! bound. All four default to enabled.
//!
//! ## Sources
//!
//! - code: [`RouterOption`] values passed to [`Router::with_options`](crate::Router::with_options)
//! - environment: [`RouterConfig::from_env`]
//! - YAML: [`RouterConfig::load`] / [`RouterConfig::from_yaml_str`]
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `NESTMUX_REDIRECT_TRAILING_SLASH` | `redirect_trailing_slash` |
//! | `NESTMUX_REDIRECT_FIXED_PATH` | `redirect_fixed_path` |
//! | `NESTMUX_HANDLE_METHOD_NOT_ALLOWED` | `handle_method_not_allowed` |
//! | `NESTMUX_HANDLE_OPTIONS` | `handle_options` |
//!
//! Values are `true` or `false`; anything else keeps the default.
//!
//! ## Example Configuration
//!
//! ```yaml
//! redirect_trailing_slash: true
//! redirect_fixed_path: false
//! handle_method_not_allowed: true
//! handle_options: true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Route table behaviour toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Redirect `/foo/` to `/foo` (and back) when only the other form is routed.
    /// 301 for GET, 307 for other methods.
    pub redirect_trailing_slash: bool,
    /// Clean the path (`../`, `//`) and retry case-insensitively, redirecting
    /// to the registered spelling on success.
    pub redirect_fixed_path: bool,
    /// Answer `405` with an `Allow` header when only other methods match.
    pub handle_method_not_allowed: bool,
    /// Answer OPTIONS automatically; explicit OPTIONS routes take priority.
    pub handle_options: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            redirect_fixed_path: true,
            handle_method_not_allowed: true,
            handle_options: true,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redirect_trailing_slash: env_bool(
                "NESTMUX_REDIRECT_TRAILING_SLASH",
                defaults.redirect_trailing_slash,
            ),
            redirect_fixed_path: env_bool(
                "NESTMUX_REDIRECT_FIXED_PATH",
                defaults.redirect_fixed_path,
            ),
            handle_method_not_allowed: env_bool(
                "NESTMUX_HANDLE_METHOD_NOT_ALLOWED",
                defaults.handle_method_not_allowed,
            ),
            handle_options: env_bool("NESTMUX_HANDLE_OPTIONS", defaults.handle_options),
        }
    }

    /// Parse YAML; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse router configuration")
    }

    /// Read and parse a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read router configuration {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn apply(&mut self, option: RouterOption) {
        match option {
            RouterOption::RedirectTrailingSlash(b) => self.redirect_trailing_slash = b,
            RouterOption::RedirectFixedPath(b) => self.redirect_fixed_path = b,
            RouterOption::HandleMethodNotAllowed(b) => self.handle_method_not_allowed = b,
            RouterOption::HandleOptions(b) => self.handle_options = b,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// A single toggle override, applied in order over the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterOption {
    RedirectTrailingSlash(bool),
    RedirectFixedPath(bool),
    HandleMethodNotAllowed(bool),
    HandleOptions(bool),
}

/// See [`RouterConfig::redirect_trailing_slash`]
#[must_use]
pub fn with_redirect_trailing_slash(b: bool) -> RouterOption {
    RouterOption::RedirectTrailingSlash(b)
}

/// See [`RouterConfig::redirect_fixed_path`]
#[must_use]
pub fn with_redirect_fixed_path(b: bool) -> RouterOption {
    RouterOption::RedirectFixedPath(b)
}

/// See [`RouterConfig::handle_method_not_allowed`]
#[must_use]
pub fn with_handle_method_not_allowed(b: bool) -> RouterOption {
    RouterOption::HandleMethodNotAllowed(b)
}

/// See [`RouterConfig::handle_options`]
#[must_use]
pub fn with_handle_options(b: bool) -> RouterOption {
    RouterOption::HandleOptions(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    #[test]
    fn test_defaults_are_all_enabled() {
        let c = RouterConfig::default();
        assert!(c.redirect_trailing_slash);
        assert!(c.redirect_fixed_path);
        assert!(c.handle_method_not_allowed);
        assert!(c.handle_options);
    }

    #[test]
    fn test_options_apply_in_order() {
        let mut c = RouterConfig::default();
        for opt in [
            with_redirect_fixed_path(false),
            with_handle_options(false),
            with_handle_options(true),
        ] {
            c.apply(opt);
        }
        assert!(!c.redirect_fixed_path);
        assert!(c.handle_options);
    }

    #[test]
    fn test_yaml_missing_keys_keep_defaults() {
        let c = RouterConfig::from_yaml_str("redirect_trailing_slash: false\n").unwrap();
        assert!(!c.redirect_trailing_slash);
        assert!(c.redirect_fixed_path);
        assert!(RouterConfig::from_yaml_str("handle_options: [1]").is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = RouterConfig::load("/nonexistent/router.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read router configuration"));
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        env::set_var("NESTMUX_HANDLE_METHOD_NOT_ALLOWED", "false");
        env::set_var("NESTMUX_REDIRECT_FIXED_PATH", "garbage");
        let c = RouterConfig::from_env();
        env::remove_var("NESTMUX_HANDLE_METHOD_NOT_ALLOWED");
        env::remove_var("NESTMUX_REDIRECT_FIXED_PATH");
        assert!(!c.handle_method_not_allowed);
        assert!(c.redirect_fixed_path);
    }
}
