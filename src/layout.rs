use serde::{Deserialize, Serialize};

use crate::math::{Dimensions, SafeRegion, Vector2};

/// Tuning values for the card layout. Every length is a percent of the
/// canvas. The defaults match the tree illustration shipped with the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Size of one card.
    pub card: Dimensions,
    /// Minimum gap kept between two cards.
    pub margin: f64,
    /// Visual center of the crown, where the spiral starts.
    pub center: Vector2,
    /// Radius growth per `sqrt(n)` step of the spiral.
    pub step_radius: f64,
    /// Vertical compression of the spiral. The crown is wider than tall.
    pub vertical_squash: f64,
    /// Where a card's top-left corner may go. Keeps cards on the canvas and
    /// off the trunk.
    pub safe_region: SafeRegion,
    pub rotation_min: f64,
    pub rotation_max: f64,
    /// Candidates tried before accepting an overlapping base position.
    pub max_attempts: u32,
    /// Radius added per failed attempt.
    pub radius_step: f64,
    /// Angle added per failed attempt, in radians, before the seed term.
    pub angle_step: f64,
    /// Seed-proportional part of the per-attempt angle.
    pub angle_seed_factor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card: Dimensions::new(16.0, 10.0),
            margin: 1.2,
            center: Vector2::new(50.0, 46.0),
            step_radius: 4.0,
            vertical_squash: 0.85,
            safe_region: SafeRegion::default(),
            rotation_min: -12.0,
            rotation_max: 12.0,
            max_attempts: 160,
            radius_step: 1.6,
            angle_step: 0.35,
            angle_seed_factor: 0.2,
        }
    }
}

impl LayoutConfig {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder {
            config: Self::default(),
        }
    }

    /// Rotation for a seed, linear across the configured range.
    #[inline]
    pub fn rotation_for(&self, seed: f64) -> f64 {
        self.rotation_min + seed * (self.rotation_max - self.rotation_min)
    }

    /// True when every placement inside the safe region keeps the whole card
    /// on the canvas.
    pub fn fits_canvas(&self) -> bool {
        let region = &self.safe_region;
        region.min_x >= 0.0
            && region.min_y >= 0.0
            && region.min_x <= region.max_x
            && region.min_y <= region.max_y
            && region.max_x + self.card.width <= 100.0
            && region.max_y + self.card.height <= 100.0
    }
}

/// Builder for adjusting a [`LayoutConfig`] starting from the defaults.
pub struct LayoutBuilder {
    pub(crate) config: LayoutConfig,
}

impl LayoutBuilder {
    #[inline]
    pub fn card(&mut self, width: f64, height: f64) -> &mut Self {
        self.config.card = Dimensions::new(width, height);
        self
    }

    #[inline]
    pub fn margin(&mut self, margin: f64) -> &mut Self {
        self.config.margin = margin;
        self
    }

    #[inline]
    pub fn center(&mut self, center: impl Into<Vector2>) -> &mut Self {
        self.config.center = center.into();
        self
    }

    /// Sets the spiral's step radius and vertical squash.
    #[inline]
    pub fn spiral(&mut self, step_radius: f64, vertical_squash: f64) -> &mut Self {
        self.config.step_radius = step_radius;
        self.config.vertical_squash = vertical_squash;
        self
    }

    #[inline]
    pub fn safe_region(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> &mut Self {
        self.config.safe_region = SafeRegion::new(min_x, max_x, min_y, max_y);
        self
    }

    #[inline]
    pub fn rotation(&mut self, min: f64, max: f64) -> &mut Self {
        self.config.rotation_min = min;
        self.config.rotation_max = max;
        self
    }

    #[inline]
    pub fn max_attempts(&mut self, attempts: u32) -> &mut Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Sets how far each retry moves outward and around.
    #[inline]
    pub fn retry_step(&mut self, radius_step: f64, angle_step: f64, angle_seed_factor: f64) -> &mut Self {
        self.config.radius_step = radius_step;
        self.config.angle_step = angle_step;
        self.config.angle_seed_factor = angle_seed_factor;
        self
    }

    pub fn build(&self) -> LayoutConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_keep_cards_on_canvas() {
        let config = LayoutConfig::default();
        assert!(config.fits_canvas());
        assert_eq!(config.rotation_for(0.0), -12.0);
        assert_eq!(config.rotation_for(0.5), 0.0);
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = LayoutConfig::builder()
            .card(20.0, 12.0)
            .margin(0.5)
            .max_attempts(10)
            .build();
        assert_eq!(config.card, Dimensions::new(20.0, 12.0));
        assert_eq!(config.margin, 0.5);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.center, Vector2::new(50.0, 46.0));
    }

    #[test]
    fn oversized_region_does_not_fit() {
        let config = LayoutConfig::builder().safe_region(0.0, 90.0, 0.0, 80.0).build();
        assert!(!config.fits_canvas());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let raw = r#"{ "margin": 2.0, "card": { "width": 12.0, "height": 8.0 } }"#;
        let parsed: LayoutConfig = serde_json::from_str(raw).expect("layout config should parse");
        assert_eq!(parsed.margin, 2.0);
        assert_eq!(parsed.card, Dimensions::new(12.0, 8.0));
        assert_eq!(parsed.max_attempts, 160);
        assert_eq!(parsed.safe_region, SafeRegion::default());
    }
}
