// src/config.rs
//! Report configuration (TOML), with env overrides.
//!
//! Resolution order for the file:
//! 1) `$TRUST_REPORT_CONFIG_PATH` (must exist)
//! 2) `config/trust_report.toml`
//! 3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::phrases::{default_patterns, InterestPattern, PhraseTable};

pub const DEFAULT_CONFIG_PATH: &str = "config/trust_report.toml";
pub const ENV_CONFIG_PATH: &str = "TRUST_REPORT_CONFIG_PATH";
pub const ENV_FANOUT_LIMIT: &str = "TRUST_REPORT_FANOUT_LIMIT";
pub const ENV_TASK_TIMEOUT_SECS: &str = "TRUST_REPORT_TASK_TIMEOUT_SECS";

/// Hard ceiling on UserProfile tasks per report; larger settings are clamped.
pub const MAX_FANOUT_LIMIT: usize = 5;
pub const DEFAULT_FANOUT_LIMIT: usize = MAX_FANOUT_LIMIT;
pub const DEFAULT_CONTRIBUTOR_CAP: usize = 1000;
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Max number of UserProfile tasks spawned per report.
    pub fanout_limit: usize,
    /// Upstream cap on the ranked contributor list.
    pub contributor_cap: usize,
    /// Edit-history page size.
    pub history_limit: usize,
    /// Per-task timeout; 0 disables it.
    pub task_timeout_secs: u64,
    pub user_agent: String,
    pub endpoints: Endpoints,
    pub phrases: Vec<InterestPattern>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            fanout_limit: DEFAULT_FANOUT_LIMIT,
            contributor_cap: DEFAULT_CONTRIBUTOR_CAP,
            history_limit: DEFAULT_HISTORY_LIMIT,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            user_agent: concat!("wiki-trust-report/", env!("CARGO_PKG_VERSION")).to_string(),
            endpoints: Endpoints::default(),
            phrases: default_patterns(),
        }
    }
}

/// URL templates, one per fetch task kind.
/// Placeholders: `{title}`, `{editor}`, `{cap}`, `{limit}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub contributors: String,
    pub edit_history: String,
    pub user_profile: String,
    pub talk_page: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            contributors:
                "https://xtools.wmcloud.org/api/page/top_editors/en.wikipedia.org/{title}///{cap}"
                    .to_string(),
            edit_history:
                "https://en.wikipedia.org/w/index.php?title={title}&limit={limit}&action=history"
                    .to_string(),
            user_profile: "https://en.wikipedia.org/wiki/User:{editor}".to_string(),
            talk_page: "https://en.wikipedia.org/wiki/Talk:{title}".to_string(),
        }
    }
}

/// Substitute `{key}` placeholders. Values are URL-encoded.
pub fn render_url(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        let needle = format!("{{{key}}}");
        out = out.replace(&needle, &urlencoding::encode(value));
    }
    out
}

impl TrustConfig {
    /// Load using env var + fallbacks (see module docs), then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from(&default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading report config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing report config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: TrustConfig = toml::from_str(s)?;
        if cfg.phrases.is_empty() {
            cfg.phrases = default_patterns();
        }
        cfg.clamp_fanout();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_env::<usize>(ENV_FANOUT_LIMIT) {
            self.fanout_limit = n;
            self.clamp_fanout();
        }
        if let Some(secs) = parse_env::<u64>(ENV_TASK_TIMEOUT_SECS) {
            self.task_timeout_secs = secs;
        }
    }

    fn clamp_fanout(&mut self) {
        if self.fanout_limit > MAX_FANOUT_LIMIT {
            tracing::warn!(
                requested = self.fanout_limit,
                max = MAX_FANOUT_LIMIT,
                "fanout_limit above maximum; clamped"
            );
            self.fanout_limit = MAX_FANOUT_LIMIT;
        }
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }

    /// Compile the phrase table. Malformed patterns fail here, at startup.
    pub fn phrase_table(&self) -> Result<PhraseTable> {
        PhraseTable::compile(&self.phrases).context("compiling interest phrases")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
