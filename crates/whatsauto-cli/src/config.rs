//! Configuration loaded from environment variables.
//!
//! Every setting has a default, so the tool runs with no configuration at
//! all. Command line flags override what is loaded here.

use std::path::PathBuf;
use std::time::Duration;

use whatsauto_send::CooldownPolicy;
use whatsauto_shared::constants::{
    COOLDOWN_MAX_MS, COOLDOWN_MIN_MS, DEFAULT_COUNTRY_CODE, MAX_PDF_SIZE,
};
use whatsauto_shared::phone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Database file.
    /// Env: `WHATSAUTO_DB`
    /// Default: `whatsauto.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Country code digits prepended to numbers without a leading `+`.
    /// Env: `WHATSAUTO_COUNTRY_CODE`
    /// Default: `1`
    pub country_code: String,

    /// Bounds of the pause between two contacts.
    /// Env: `WHATSAUTO_COOLDOWN_MIN_SECS`, `WHATSAUTO_COOLDOWN_MAX_SECS`
    /// Default: 60 and 120 seconds.
    pub cooldown_min: Duration,
    pub cooldown_max: Duration,

    /// Share command tried before the URL handler, e.g. `termux-share`.
    /// Env: `WHATSAUTO_SHARE_COMMAND`
    /// Default: none (URL handler only).
    pub share_command: Option<String>,

    /// Largest PDF accepted by `docs upload`.
    /// Env: `WHATSAUTO_MAX_PDF_BYTES`
    /// Default: 50 MiB.
    pub max_pdf_bytes: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            cooldown_min: Duration::from_millis(COOLDOWN_MIN_MS),
            cooldown_max: Duration::from_millis(COOLDOWN_MAX_MS),
            share_command: None,
            max_pdf_bytes: MAX_PDF_SIZE,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CliConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("WHATSAUTO_DB").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(code) = lookup("WHATSAUTO_COUNTRY_CODE") {
            match phone::validate_country_code(&code) {
                Ok(valid) => config.country_code = valid.to_string(),
                Err(e) => tracing::warn!(error = %e, "Invalid WHATSAUTO_COUNTRY_CODE, using default"),
            }
        }

        if let Some(val) = lookup("WHATSAUTO_COOLDOWN_MIN_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) => config.cooldown_min = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %val, "Invalid WHATSAUTO_COOLDOWN_MIN_SECS, using default"),
            }
        }

        if let Some(val) = lookup("WHATSAUTO_COOLDOWN_MAX_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) => config.cooldown_max = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %val, "Invalid WHATSAUTO_COOLDOWN_MAX_SECS, using default"),
            }
        }

        if let Some(command) = lookup("WHATSAUTO_SHARE_COMMAND") {
            if !command.trim().is_empty() {
                config.share_command = Some(command);
            }
        }

        if let Some(val) = lookup("WHATSAUTO_MAX_PDF_BYTES") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_pdf_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid WHATSAUTO_MAX_PDF_BYTES, using default"),
            }
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    /// The configured cooldown range, or the default one when the bounds
    /// do not form a range.
    pub fn cooldown_policy(&self) -> CooldownPolicy {
        CooldownPolicy::new(self.cooldown_min, self.cooldown_max).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default cooldown range");
            CooldownPolicy::default()
        })
    }
}
