#![forbid(unsafe_code)]

//! User preferences for input handling and dispatch.
//!
//! [`Preferences`] groups the input tunables consumed by the normalizer
//! ([`InputConfig`]) and the dispatch tunables consumed by the runtime
//! ([`DispatchConfig`]). With the `prefs-config` feature the whole set can be
//! loaded from TOML or JSON:
//!
//! ```toml
//! [input]
//! double_click_ms = 500
//! emulate_3_button = true
//!
//! [dispatch]
//! continuous_mouse = false
//! tooltip_delay_ms = 300
//! ```
//!
//! ```rust,ignore
//! let prefs = Preferences::from_toml_file("kwm.toml")?;
//! ```
//!
//! Missing fields keep their defaults. [`SharedPreferences`] publishes a
//! new set from any thread; the window manager picks it up on its next
//! step.

#[cfg(feature = "prefs-config")]
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use kwm_core::config::InputConfig;
#[cfg(feature = "prefs-config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

pub const MAX_TOOLTIP_DELAY_MS: u64 = 10_000;
pub const MAX_MOTION_THRESHOLD: i32 = 255;
pub const MAX_REGISTERED_OPERATORS: usize = 1024;

/// Dispatch-loop tunables.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "prefs-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "prefs-config", serde(default))]
pub struct DispatchConfig {
    /// Wrap the cursor for blocking modal operators.
    pub continuous_mouse: bool,
    pub tooltip_delay_ms: u64,
    /// Cursor travel (Manhattan, unscaled pixels) that closes an
    /// exit-on-event tooltip.
    pub tooltip_motion_threshold: i32,
    /// Finished REGISTER operators kept in history.
    pub max_registered_operators: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            continuous_mouse: true,
            tooltip_delay_ms: 500,
            tooltip_motion_threshold: 3,
            max_registered_operators: 32,
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn tooltip_delay(&self) -> Duration {
        Duration::from_millis(self.tooltip_delay_ms)
    }

    #[must_use]
    pub fn with_continuous_mouse(mut self, enabled: bool) -> Self {
        self.continuous_mouse = enabled;
        self
    }

    #[must_use]
    pub fn with_tooltip_delay_ms(mut self, ms: u64) -> Self {
        self.tooltip_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_tooltip_motion_threshold(mut self, px: i32) -> Self {
        self.tooltip_motion_threshold = px;
        self
    }

    /// Defaults overridden by `KWM_CONTINUOUS_MOUSE` and
    /// `KWM_TOOLTIP_DELAY_MS`, then validated.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("KWM_CONTINUOUS_MOUSE") {
            config.continuous_mouse = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("KWM_TOOLTIP_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.tooltip_delay_ms = ms;
        }
        config.validated()
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.tooltip_delay_ms = self.tooltip_delay_ms.min(MAX_TOOLTIP_DELAY_MS);
        self.tooltip_motion_threshold = self.tooltip_motion_threshold.clamp(0, MAX_MOTION_THRESHOLD);
        self.max_registered_operators = self.max_registered_operators.min(MAX_REGISTERED_OPERATORS);
        self
    }

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tooltip_delay_ms > MAX_TOOLTIP_DELAY_MS {
            errors.push(format!(
                "dispatch.tooltip_delay_ms must be <= {MAX_TOOLTIP_DELAY_MS}, got {}",
                self.tooltip_delay_ms
            ));
        }
        if !(0..=MAX_MOTION_THRESHOLD).contains(&self.tooltip_motion_threshold) {
            errors.push(format!(
                "dispatch.tooltip_motion_threshold must be in 0..={MAX_MOTION_THRESHOLD}, got {}",
                self.tooltip_motion_threshold
            ));
        }
        if self.max_registered_operators > MAX_REGISTERED_OPERATORS {
            errors.push(format!(
                "dispatch.max_registered_operators must be <= {MAX_REGISTERED_OPERATORS}, got {}",
                self.max_registered_operators
            ));
        }
        errors
    }
}

/// Every user-tunable setting of the window manager.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "prefs-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "prefs-config", serde(default))]
pub struct Preferences {
    pub input: InputConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to read preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {format} preferences: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("invalid preferences: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl Preferences {
    /// Input and dispatch settings from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            input: InputConfig::from_env(),
            dispatch: DispatchConfig::from_env(),
        }
    }

    #[cfg(feature = "prefs-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, PrefsError> {
        let prefs: Self = toml::from_str(s).map_err(|e| PrefsError::Parse {
            format: "TOML",
            message: e.to_string(),
        })?;
        prefs.checked()
    }

    #[cfg(feature = "prefs-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "prefs-config")]
    pub fn from_json_str(s: &str) -> Result<Self, PrefsError> {
        let prefs: Self = serde_json::from_str(s).map_err(|e| PrefsError::Parse {
            format: "JSON",
            message: e.to_string(),
        })?;
        prefs.checked()
    }

    #[cfg(feature = "prefs-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize as pretty TOML.
    #[cfg(feature = "prefs-config")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Every problem with the current values; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.input.validate();
        errors.extend(self.dispatch.validate());
        errors
    }

    /// `self` when valid, otherwise every problem as one error.
    pub fn checked(self) -> Result<Self, PrefsError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(PrefsError::Validation(errors))
        }
    }

    #[must_use]
    pub fn validated(self) -> Self {
        Self {
            input: self.input.validated(),
            dispatch: self.dispatch.validated(),
        }
    }
}

// ---------------------------------------------------------------------------
// Live reload
// ---------------------------------------------------------------------------

/// Preferences handle that can be swapped from any thread.
#[derive(Debug, Clone)]
pub struct SharedPreferences {
    inner: Arc<ArcSwap<Preferences>>,
}

impl Default for SharedPreferences {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl SharedPreferences {
    #[must_use]
    pub fn new(prefs: Preferences) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(prefs)),
        }
    }

    /// Current preferences.
    #[must_use]
    pub fn load(&self) -> Arc<Preferences> {
        self.inner.load_full()
    }

    /// Publish a new set, clamped into range.
    pub fn store(&self, prefs: Preferences) {
        self.inner.store(Arc::new(prefs.validated()));
    }
}
