use crate::config::{HeightConfig, LayoutConfig};
use crate::text_metrics;

/// Estimates the rendered height of a node card from its text. Swappable so a
/// renderer with exact text measurement can plug in without touching the
/// refiner.
pub trait HeightEstimator: Send + Sync {
    fn estimate(&self, title: &str, description: &str) -> f32;
}

/// Character-count heuristic. Monotonic in title and description length.
#[derive(Debug, Clone)]
pub struct HeuristicHeight {
    config: HeightConfig,
}

impl HeuristicHeight {
    pub fn new(config: HeightConfig) -> Self {
        Self { config }
    }
}

impl Default for HeuristicHeight {
    fn default() -> Self {
        Self::new(HeightConfig::default())
    }
}

impl HeightEstimator for HeuristicHeight {
    fn estimate(&self, title: &str, description: &str) -> f32 {
        let cfg = &self.config;
        let title_chars = title.chars().count();
        let desc_chars = description.chars().count();
        let extra_title =
            title_chars.saturating_sub(cfg.title_free_chars) as f32 * cfg.title_char_height;
        let desc_lines = desc_chars.div_ceil(cfg.description_chars_per_line.max(1));
        let height = cfg.base + desc_lines as f32 * cfg.line_height + extra_title;
        clamp_height(height, cfg)
    }
}

/// Wraps title and description with real font advances. Falls back to the
/// heuristic when no font can be loaded.
#[derive(Debug, Clone)]
pub struct MeasuredHeight {
    config: HeightConfig,
    node_width: f32,
    fallback: HeuristicHeight,
}

impl MeasuredHeight {
    pub fn new(config: HeightConfig, node_width: f32) -> Self {
        Self {
            fallback: HeuristicHeight::new(config.clone()),
            config,
            node_width,
        }
    }
}

impl HeightEstimator for MeasuredHeight {
    fn estimate(&self, title: &str, description: &str) -> f32 {
        let cfg = &self.config;
        let text_width = (self.node_width - 2.0 * cfg.text_padding_x).max(1.0);
        let family = cfg.font_family.as_str();
        let title_lines =
            text_metrics::wrapped_line_count(title, text_width, cfg.font_size * 1.2, family);
        let desc_lines = text_metrics::wrapped_line_count(description, text_width, cfg.font_size, family);
        let (Some(title_lines), Some(desc_lines)) = (title_lines, desc_lines) else {
            return self.fallback.estimate(title, description);
        };
        let height = cfg.base
            + title_lines.saturating_sub(1) as f32 * cfg.line_height
            + desc_lines as f32 * cfg.line_height;
        clamp_height(height, cfg)
    }
}

fn clamp_height(height: f32, cfg: &HeightConfig) -> f32 {
    height.clamp(cfg.base, cfg.max.max(cfg.base))
}

pub fn estimator_for(config: &LayoutConfig) -> Box<dyn HeightEstimator> {
    if config.measured_heights {
        Box::new(MeasuredHeight::new(config.height.clone(), config.node_width))
    } else {
        Box::new(HeuristicHeight::new(config.height.clone()))
    }
}
