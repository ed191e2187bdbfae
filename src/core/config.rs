//! Session configuration.
//!
//! Hosts configure a session once, at construction:
//! - grid shape (`columns` × `rows`, must be even)
//! - countdown length and timing
//! - `Theme`: display metadata the engine never interprets
//!
//! Configs can be built in code or loaded from TOML. Missing keys fall
//! back to the defaults of the classic 4×4, 60 second game.
//!
//! ```
//! use pairs_engine::core::SessionConfig;
//!
//! let config = SessionConfig::from_toml_str("columns = 2\nrows = 3\n").unwrap();
//! assert_eq!(config.total_pairs(), 3);
//! assert_eq!(config.time_limit_secs, 60);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{GameError, Result};

/// Default countdown length.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
/// Delay before a mismatched pair is turned face down again.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
/// Countdown resolution.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Display metadata passed through to the render sink untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Card back color, any CSS-like string.
    pub color: String,
    /// Font family list.
    pub font: String,
    /// Preferred board width in pixels.
    pub width: u32,
    /// Preferred board height in pixels.
    pub height: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            color: "#336699".to_string(),
            font: "Helvetica, sans-serif".to_string(),
            width: 400,
            height: 400,
        }
    }
}

impl Theme {
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cards per row.
    pub columns: u32,

    /// Number of rows.
    pub rows: u32,

    /// Countdown length in seconds. Zero is accepted and loses on the
    /// first tick.
    pub time_limit_secs: u32,

    /// Settle delay after a mismatch, in milliseconds.
    pub settle_delay_ms: u64,

    /// Interval between countdown ticks, in milliseconds.
    pub tick_interval_ms: u64,

    /// Opaque display metadata.
    pub theme: Theme,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 4,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            theme: Theme::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for a `columns` × `rows` grid with default timing.
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the countdown length.
    #[must_use]
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Set the mismatch settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the countdown tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the display theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Check that this configuration can produce a playable grid.
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GameError::invalid(format!(
                "grid must have at least one column and one row, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.card_count() % 2 != 0 {
            return Err(GameError::invalid(format!(
                "grid {}x{} has an odd number of cards",
                self.columns, self.rows
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::invalid("tick interval must be positive"));
        }
        Ok(())
    }

    /// Total number of cards on the grid.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Number of distinct identities, each appearing twice.
    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.card_count() / 2
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
