// Site configuration module
pub mod theme; // Theme identifiers and palettes

// Structure for the entire site configuration loaded from JSON.
// This mirrors the structure of assets/config/default.json; every policy
// constant (thresholds, delays, window sizes) is read from there.
use crate::error::SiteError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub use theme::{Theme, ThemeColors, ThemeData};

pub const DEBUG_QUERY_KEY: &str = "debug";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SiteConfig {
    pub version: String,
    pub site: SiteSettings,
    pub boundaries: BoundaryPolicy,
    pub performance: PerformancePolicy,
    pub integration: IntegrationPolicy,
    pub contact: ContactSettings,
    pub leaves: LeafConfig,
    pub skills: Vec<SkillSpec>,
    #[serde(default)]
    pub images: Vec<ImageSpec>,
    pub coffee: CoffeeSettings,
    // Not part of the JSON: set from the page location's `debug=true` query pair.
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SiteSettings {
    pub title: String,
    pub default_theme: Theme,
    pub preference_key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BoundaryPolicy {
    pub component_error_threshold: u32,
    pub auto_recovery_delay_ms: u64,
    pub auto_reset_threshold: u32,
    pub reload_threshold: u32,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self {
            component_error_threshold: 3,
            auto_recovery_delay_ms: 30_000,
            auto_reset_threshold: 10,
            reload_threshold: 20,
        }
    }
}

impl BoundaryPolicy {
    pub fn auto_recovery_delay(&self) -> Duration {
        Duration::from_millis(self.auto_recovery_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PerformancePolicy {
    pub frame_window: usize,
    pub low_fps_threshold: f64,
    pub global_error_threshold: u32,
    pub memory_check_interval_ms: u64,
    pub memory_ratio_threshold: f64,
    pub memory_history: usize,
    pub memory_trim_frames: usize,
    pub report_interval_ms: u64,
}

impl Default for PerformancePolicy {
    fn default() -> Self {
        Self {
            frame_window: 60,
            low_fps_threshold: 30.0,
            global_error_threshold: 5,
            memory_check_interval_ms: 30_000,
            memory_ratio_threshold: 0.8,
            memory_history: 10,
            memory_trim_frames: 30,
            report_interval_ms: 60_000,
        }
    }
}

impl PerformancePolicy {
    pub fn memory_check_interval(&self) -> Duration {
        Duration::from_millis(self.memory_check_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IntegrationPolicy {
    pub transition_ms: u64,
    pub slow_integration_ms: u64,
    pub expected_components: Vec<String>,
}

impl Default for IntegrationPolicy {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            slow_integration_ms: 1000,
            expected_components: ["theme", "leaves", "skills", "contact", "coffee"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl IntegrationPolicy {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn slow_integration(&self) -> Duration {
        Duration::from_millis(self.slow_integration_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContactSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub success_display_ms: u64,
    pub error_display_ms: u64,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/contact".to_string(),
            timeout_ms: 10_000,
            success_display_ms: 4_000,
            error_display_ms: 5_000,
        }
    }
}

impl ContactSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LeafConfig {
    pub leaf_count: usize,
    pub min_size: f64,
    pub max_size: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub sway_amplitude: f64,
    pub sway_frequency: f64,
    pub frame_budget_ms: f64,
    pub min_leaves: usize,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self {
            leaf_count: 15,
            min_size: 8.0,
            max_size: 20.0,
            min_speed: 0.5,
            max_speed: 2.0,
            sway_amplitude: 30.0,
            sway_frequency: 0.02,
            frame_budget_ms: 16.67,
            min_leaves: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SkillSpec {
    pub name: String,
    pub level: u8, // percent
    pub category: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ImageSpec {
    pub id: String,
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CoffeeSettings {
    pub url: String,
    pub press_ms: u64,
}

impl SiteConfig {
    // The default config is embedded so the binary runs from any working directory.
    pub fn load_default() -> Result<Self, SiteError> {
        let config_str = include_str!("../../assets/config/default.json");
        Self::from_json(config_str)
    }

    pub fn from_json(raw: &str) -> Result<Self, SiteError> {
        let config: SiteConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Turns on the debug readout when the page location carries `debug=true`.
    pub fn with_location(mut self, location: &str) -> Self {
        self.debug = debug_requested(location);
        self
    }

    fn validate(&self) -> Result<(), SiteError> {
        if self.boundaries.component_error_threshold == 0 {
            return Err(SiteError::Config("component_error_threshold must be at least 1".into()));
        }
        if self.performance.frame_window == 0 {
            return Err(SiteError::Config("frame_window must be at least 1".into()));
        }
        if self.performance.memory_trim_frames > self.performance.frame_window {
            return Err(SiteError::Config("memory_trim_frames cannot exceed frame_window".into()));
        }
        Ok(())
    }
}

pub fn debug_requested(location: &str) -> bool {
    match Url::parse(location) {
        Ok(url) => url.query_pairs().any(|(k, v)| k == DEBUG_QUERY_KEY && v == "true"),
        Err(e) => {
            tracing::debug!(location, error = %e, "Page location is not a URL; debug readout stays off");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = SiteConfig::load_default().unwrap();
        assert_eq!(config.boundaries, BoundaryPolicy::default());
        assert_eq!(config.performance, PerformancePolicy::default());
        assert_eq!(config.contact.timeout(), Duration::from_secs(10));
        assert_eq!(config.site.default_theme, Theme::Light);
        assert_eq!(config.site.preference_key, "portfolio-theme");
        assert!(!config.skills.is_empty());
        assert!(!config.debug);
    }

    #[test]
    fn test_debug_flag_from_location() {
        assert!(debug_requested("https://example.dev/?debug=true"));
        assert!(debug_requested("app://portfolio/index.html?lang=en&debug=true"));
        assert!(!debug_requested("https://example.dev/?debug=false"));
        assert!(!debug_requested("https://example.dev/"));
        assert!(!debug_requested("not a url"));
    }

    #[test]
    fn test_with_location_sets_debug() {
        let config = SiteConfig::load_default().unwrap().with_location("https://example.dev/?debug=true");
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let raw = include_str!("../../assets/config/default.json")
            .replace("\"frame_window\": 60", "\"frame_window\": 0");
        assert!(matches!(SiteConfig::from_json(&raw), Err(SiteError::Config(_))));
    }
}
