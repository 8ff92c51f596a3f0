#![forbid(unsafe_code)]

//! Input preferences consumed by the normalizer and the drag/click tests.
//!
//! [`InputConfig`] collects every user-tunable input constant: the
//! double-click window, drag thresholds per device class, UI scale, button
//! and numpad emulation, the tablet pressure curve and the mouse-move
//! coalescing policy.
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `KWM_DOUBLE_CLICK_MS` | Double-click window in milliseconds |
//! | `KWM_DRAG_THRESHOLD` | Mouse drag threshold in pixels |
//! | `KWM_UI_SCALE` | UI scale factor applied to thresholds |
//! | `KWM_EMULATE_3_BUTTON` | `1`/`true` enables middle-button emulation |
//! | `KWM_EMULATE_NUMPAD` | `1`/`true` enables numpad emulation |

use web_time::Duration;

/// Bounds applied by [`InputConfig::validated`].
pub const MIN_DOUBLE_CLICK_MS: u64 = 1;
pub const MAX_DOUBLE_CLICK_MS: u64 = 5000;
pub const MIN_DRAG_THRESHOLD: i32 = 1;
pub const MAX_DRAG_THRESHOLD: i32 = 255;
pub const MIN_UI_SCALE: f32 = 0.25;
pub const MAX_UI_SCALE: f32 = 4.0;

/// Modifier that turns a left click into a middle click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EmulationModifier {
    #[default]
    Alt,
    OsKey,
}

/// How consecutive mouse moves collapse in a window queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MoveCoalescing {
    /// The previous tail move is demoted to an in-between sample and kept.
    #[default]
    KeepInbetween,
    /// The previous tail move is replaced; only the latest sample survives.
    LatestOnly,
}

/// Input preferences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputConfig {
    /// Max time between two presses to count as a double click (default: 350).
    pub double_click_ms: u64,
    /// Drag threshold after a mouse button press, in pixels (default: 3).
    pub drag_threshold_mouse: i32,
    /// Drag threshold after a tablet press, in pixels (default: 10).
    pub drag_threshold_tablet: i32,
    /// Drag threshold after keyboard and other presses, in pixels (default: 30).
    pub drag_threshold: i32,
    /// UI scale; thresholds are multiplied by it (default: 1.0).
    pub ui_scale: f32,
    /// Emulate the middle button with modifier + left click (default: off).
    pub emulate_3_button: bool,
    pub emulate_3_button_modifier: EmulationModifier,
    /// Remap top-row digits and punctuation to numpad keys (default: off).
    pub emulate_numpad: bool,
    /// Raw pressure mapped to full pressure (default: 1.0).
    pub pressure_threshold_max: f32,
    /// Pressure curve exponent control, `-1.0..=1.0` (default: 0.0).
    pub pressure_softness: f32,
    pub move_coalescing: MoveCoalescing,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 350,
            drag_threshold_mouse: 3,
            drag_threshold_tablet: 10,
            drag_threshold: 30,
            ui_scale: 1.0,
            emulate_3_button: false,
            emulate_3_button_modifier: EmulationModifier::Alt,
            emulate_numpad: false,
            pressure_threshold_max: 1.0,
            pressure_softness: 0.0,
            move_coalescing: MoveCoalescing::KeepInbetween,
        }
    }
}

impl InputConfig {
    /// Double-click window as a duration.
    #[must_use]
    pub fn double_click_time(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    #[must_use]
    pub fn with_double_click_ms(mut self, ms: u64) -> Self {
        self.double_click_ms = ms;
        self
    }

    /// Set the mouse, tablet and keyboard drag thresholds.
    #[must_use]
    pub fn with_drag_thresholds(mut self, mouse: i32, tablet: i32, other: i32) -> Self {
        self.drag_threshold_mouse = mouse;
        self.drag_threshold_tablet = tablet;
        self.drag_threshold = other;
        self
    }

    #[must_use]
    pub fn with_ui_scale(mut self, scale: f32) -> Self {
        self.ui_scale = scale;
        self
    }

    #[must_use]
    pub fn with_emulate_3_button(mut self, enabled: bool, modifier: EmulationModifier) -> Self {
        self.emulate_3_button = enabled;
        self.emulate_3_button_modifier = modifier;
        self
    }

    #[must_use]
    pub fn with_emulate_numpad(mut self, enabled: bool) -> Self {
        self.emulate_numpad = enabled;
        self
    }

    #[must_use]
    pub fn with_pressure_curve(mut self, threshold_max: f32, softness: f32) -> Self {
        self.pressure_threshold_max = threshold_max;
        self.pressure_softness = softness;
        self
    }

    #[must_use]
    pub fn with_move_coalescing(mut self, policy: MoveCoalescing) -> Self {
        self.move_coalescing = policy;
        self
    }

    /// Defaults overridden by `KWM_*` environment variables, then validated.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("KWM_DOUBLE_CLICK_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.double_click_ms = ms;
        }

        if let Ok(val) = std::env::var("KWM_DRAG_THRESHOLD")
            && let Ok(px) = val.parse::<i32>()
        {
            config.drag_threshold_mouse = px;
        }

        if let Ok(val) = std::env::var("KWM_UI_SCALE")
            && let Ok(scale) = val.parse::<f32>()
        {
            config.ui_scale = scale;
        }

        if let Ok(val) = std::env::var("KWM_EMULATE_3_BUTTON") {
            config.emulate_3_button = val == "1" || val.eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("KWM_EMULATE_NUMPAD") {
            config.emulate_numpad = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config.validated()
    }

    /// Clamp every value into its supported range.
    ///
    /// Non-finite floats fall back to their defaults.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.double_click_ms = self
            .double_click_ms
            .clamp(MIN_DOUBLE_CLICK_MS, MAX_DOUBLE_CLICK_MS);
        self.drag_threshold_mouse = self
            .drag_threshold_mouse
            .clamp(MIN_DRAG_THRESHOLD, MAX_DRAG_THRESHOLD);
        self.drag_threshold_tablet = self
            .drag_threshold_tablet
            .clamp(MIN_DRAG_THRESHOLD, MAX_DRAG_THRESHOLD);
        self.drag_threshold = self
            .drag_threshold
            .clamp(MIN_DRAG_THRESHOLD, MAX_DRAG_THRESHOLD);

        self.ui_scale = if self.ui_scale.is_finite() {
            self.ui_scale.clamp(MIN_UI_SCALE, MAX_UI_SCALE)
        } else {
            defaults.ui_scale
        };
        self.pressure_threshold_max = if self.pressure_threshold_max.is_finite() {
            self.pressure_threshold_max.clamp(0.0, 1.0)
        } else {
            defaults.pressure_threshold_max
        };
        self.pressure_softness = if self.pressure_softness.is_finite() {
            self.pressure_softness.clamp(-1.0, 1.0)
        } else {
            defaults.pressure_softness
        };
        self
    }

    /// Human-readable problems with the current values; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(MIN_DOUBLE_CLICK_MS..=MAX_DOUBLE_CLICK_MS).contains(&self.double_click_ms) {
            errors.push(format!(
                "input.double_click_ms must be in {MIN_DOUBLE_CLICK_MS}..={MAX_DOUBLE_CLICK_MS}, got {}",
                self.double_click_ms
            ));
        }
        for (name, value) in [
            ("drag_threshold_mouse", self.drag_threshold_mouse),
            ("drag_threshold_tablet", self.drag_threshold_tablet),
            ("drag_threshold", self.drag_threshold),
        ] {
            if !(MIN_DRAG_THRESHOLD..=MAX_DRAG_THRESHOLD).contains(&value) {
                errors.push(format!(
                    "input.{name} must be in {MIN_DRAG_THRESHOLD}..={MAX_DRAG_THRESHOLD}, got {value}"
                ));
            }
        }
        if !(MIN_UI_SCALE..=MAX_UI_SCALE).contains(&self.ui_scale) {
            errors.push(format!(
                "input.ui_scale must be in {MIN_UI_SCALE}..={MAX_UI_SCALE}, got {}",
                self.ui_scale
            ));
        }
        if !(0.0..=1.0).contains(&self.pressure_threshold_max) {
            errors.push(format!(
                "input.pressure_threshold_max must be in 0..=1, got {}",
                self.pressure_threshold_max
            ));
        }
        if !(-1.0..=1.0).contains(&self.pressure_softness) {
            errors.push(format!(
                "input.pressure_softness must be in -1..=1, got {}",
                self.pressure_softness
            ));
        }
        errors
    }
}
