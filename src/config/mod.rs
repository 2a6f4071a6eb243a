//! Render and resolution settings.
//!
//! Settings live in the `[settings]` table of `scriptplan.toml`. Every key is
//! optional; missing keys fall back to [`Settings::default`]. Two environment
//! variables can override the file so that a deployment can flip a site into
//! debug mode without editing the catalog:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SCRIPTPLAN_DEBUG` | `1`/`true` selects debug paths, `0`/`false` production paths |
//! | `SCRIPTPLAN_RENDER_MODE` | `simple` or `async` |
//!
//! Command-line flags take precedence over both.
//!
//! ```toml
//! [settings]
//! scripts-folder = "/ui/"
//! debug = true
//! render-mode = "simple"
//! conflict-policy = "relayer"
//! ```

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::PlanError;

/// Environment variable overriding [`Settings::debug`].
pub const DEBUG_ENV: &str = "SCRIPTPLAN_DEBUG";
/// Environment variable overriding [`Settings::render_mode`].
pub const RENDER_MODE_ENV: &str = "SCRIPTPLAN_RENDER_MODE";

/// Output strategy for a finished plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One `<script>` tag per resource, in load order. Easy to read and debug.
    Simple,
    /// A staged `$LAB` loader call chain that fetches each group in parallel.
    #[default]
    Async,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Async => write!(f, "async"),
        }
    }
}

impl std::str::FromStr for RenderMode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "async" => Ok(Self::Async),
            other => Err(PlanError::ConfigError {
                message: format!("unknown render mode '{other}' (expected 'simple' or 'async')"),
            }),
        }
    }
}

/// What the merge engine does when two trees order shared resources differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail the resolution pass with a structural merge conflict.
    #[default]
    Reject,
    /// Rebuild the union of both trees with a longest-path layering.
    Relayer,
}

/// Settings shared by the resolver and the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Prefix for script paths that are neither absolute nor URLs.
    pub scripts_folder: String,
    /// Prefix for stylesheet paths that are neither absolute nor URLs.
    pub css_folder: String,
    /// Loader library path used in debug mode.
    pub loader_src: String,
    /// Loader library path used in production.
    pub loader_min: String,
    /// Select debug paths instead of production paths.
    pub debug: bool,
    /// Output strategy.
    pub render_mode: RenderMode,
    /// Merge conflict handling.
    pub conflict_policy: ConflictPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scripts_folder: "/scripts/".to_string(),
            css_folder: "/content/".to_string(),
            loader_src: "LAB.src.js".to_string(),
            loader_min: "LAB.min.js".to_string(),
            debug: false,
            render_mode: RenderMode::Async,
            conflict_policy: ConflictPolicy::Reject,
        }
    }
}

impl Settings {
    /// Apply `SCRIPTPLAN_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Split out from [`apply_env_overrides`](Self::apply_env_overrides) so tests
    /// do not have to touch the process environment.
    pub fn apply_overrides_from<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = get(DEBUG_ENV) {
            self.debug = parse_flag(&value).ok_or_else(|| PlanError::ConfigError {
                message: format!("{DEBUG_ENV} must be 1, 0, true or false (got '{value}')"),
            })?;
            tracing::debug!("debug mode overridden by {DEBUG_ENV}: {}", self.debug);
        }

        if let Some(value) = get(RENDER_MODE_ENV) {
            self.render_mode = value.parse()?;
            tracing::debug!("render mode overridden by {RENDER_MODE_ENV}: {}", self.render_mode);
        }

        Ok(())
    }

    /// The loader library path for the current debug setting.
    #[must_use]
    pub fn loader_path(&self) -> &str {
        if self.debug {
            &self.loader_src
        } else {
            &self.loader_min
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
