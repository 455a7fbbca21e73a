use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timeline config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("name column bounds are inverted: min {min} > max {max}")]
    InvertedColumnBounds { min: f64, max: f64 },
}

/// Fixed row heights used by the row projector. Heights are a static lookup
/// rather than measured, so no per-row measure/reflow cycle is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowHeights {
    pub bar: f64,
    pub detail: f64,
    pub detail_with_logs: f64,
}

impl Default for RowHeights {
    fn default() -> Self {
        Self {
            bar: 28.0,
            detail: 161.0,
            detail_with_logs: 197.0,
        }
    }
}

/// Every tunable constant of the timeline viewer.
///
/// Missing JSON fields fall back to their defaults, so a config file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub row_heights: RowHeights,
    /// Rows drawn on each side of the visible range when the list redraws.
    pub view_buffer: usize,
    /// Rows that must stay drawn on each side before a redraw is forced.
    pub view_buffer_min: usize,
    /// Rows drawn before the viewport has been measured.
    pub initial_draw: usize,
    /// Page up/down distance as a fraction of the view height.
    pub page_scroll_factor: f64,
    /// Duration of programmatic scroll tweens (ms).
    pub tween_duration_ms: u64,
    /// Fraction of the view height used to center a navigation target.
    pub center_factor: f64,
    pub name_column_width: f64,
    pub name_column_min: f64,
    pub name_column_max: f64,
    /// View range change per pan/zoom keystroke.
    pub pan_step: f64,
    pub pan_step_fast: f64,
    /// Smallest committed view range width.
    pub min_view_range: f64,
    /// Number of header ticks, including both ends.
    pub tick_count: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            row_heights: RowHeights::default(),
            view_buffer: 300,
            view_buffer_min: 100,
            initial_draw: 100,
            page_scroll_factor: 0.95,
            tween_duration_ms: 350,
            center_factor: 0.5,
            name_column_width: 0.25,
            name_column_min: 0.15,
            name_column_max: 0.85,
            pan_step: 0.005,
            pan_step_fast: 0.05,
            min_view_range: 0.01,
            tick_count: 5,
        }
    }
}

impl TimelineConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("row_heights.bar", self.row_heights.bar),
            ("row_heights.detail", self.row_heights.detail),
            ("row_heights.detail_with_logs", self.row_heights.detail_with_logs),
            ("page_scroll_factor", self.page_scroll_factor),
            ("min_view_range", self.min_view_range),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.name_column_min > self.name_column_max {
            return Err(ConfigError::InvertedColumnBounds {
                min: self.name_column_min,
                max: self.name_column_max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_constants() {
        let c = TimelineConfig::default();
        assert_eq!(c.row_heights.bar, 28.0);
        assert_eq!(c.row_heights.detail, 161.0);
        assert_eq!(c.row_heights.detail_with_logs, 197.0);
        assert_eq!(c.view_buffer, 300);
        assert_eq!(c.view_buffer_min, 100);
        assert_eq!(c.tween_duration_ms, 350);
        assert!((c.page_scroll_factor - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = br#"{ "view_buffer": 50, "row_heights": { "bar": 1.0 } }"#;
        let c = TimelineConfig::from_json(json).expect("valid config");
        assert_eq!(c.view_buffer, 50);
        assert_eq!(c.row_heights.bar, 1.0);
        assert_eq!(c.row_heights.detail, 161.0);
        assert_eq!(c.view_buffer_min, 100);
    }

    #[test]
    fn rejects_non_positive_heights() {
        let json = br#"{ "row_heights": { "bar": 0.0 } }"#;
        assert!(matches!(
            TimelineConfig::from_json(json),
            Err(ConfigError::NotPositive { field: "row_heights.bar", .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            TimelineConfig::from_json(b"{ nope"),
            Err(ConfigError::Json(_))
        ));
    }
}
