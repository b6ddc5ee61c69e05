//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Spot categories offered for selection, in display order.
pub const DEFAULT_SPOT_CATEGORIES: [&str; 8] = [
    "旧跡",
    "神社・仏閣",
    "石碑・記念碑",
    "展望台",
    "休憩所",
    "トイレ",
    "バス停",
    "交差点",
];

/// Configuration shared by the editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Per-axis tolerance, in degrees, when a waypoint is located by position.
    /// Default: 1e-6 (about 0.1 m)
    pub match_epsilon_deg: f64,
    /// Prefix of generated spot names (`仮1`, `仮2`, ...).
    pub placeholder_prefix: String,
    /// Categories a spot can be assigned. Not enforced on write.
    pub spot_categories: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            match_epsilon_deg: 1e-6,
            placeholder_prefix: "仮".to_string(),
            spot_categories: DEFAULT_SPOT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}
