//! Card layout engine.
//!
//! Cards are scattered over the canvas along a golden-angle spiral around
//! the crown of the tree. A card that would land too close to one already
//! placed is pushed outward and around until it fits, or the attempt
//! budget runs out and it keeps its base position.

use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::id::Seed;
use crate::layout::LayoutConfig;
use crate::math::{Placement, PlacementRect};
use crate::message::MessageRecord;

// ============================================================================
// Constants
// ============================================================================

/// `π * (3 - √5)`, the angle between consecutive seeds of a sunflower head.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Left, top and rotation of the eight hand-tuned slots around the tree.
const DEFAULT_SLOTS: [(f64, f64, f64); 8] = [
    (20.0, 15.0, -5.0),
    (70.0, 20.0, 8.0),
    (15.0, 45.0, -12.0),
    (75.0, 40.0, 15.0),
    (25.0, 70.0, -8.0),
    (65.0, 75.0, 10.0),
    (45.0, 25.0, 3.0),
    (50.0, 60.0, -6.0),
];

// ============================================================================
// Strategies
// ============================================================================

/// Proposes card positions. Attempt `0` is the strategy's base position;
/// later attempts are alternatives tried when earlier ones collide.
pub trait PositionStrategy {
    fn candidate(&self, config: &LayoutConfig, index: usize, seed: Seed, attempt: u32) -> Placement;
}

/// Golden-angle spiral. Radius grows with `sqrt(n)` so card density stays
/// roughly even as the list grows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spiral;

impl PositionStrategy for Spiral {
    fn candidate(&self, config: &LayoutConfig, index: usize, seed: Seed, attempt: u32) -> Placement {
        let seed = seed.value();
        let n = (index + 1) as f64;
        let k = attempt as f64;

        let radius = config.step_radius * n.sqrt() + k * config.radius_step;
        let theta = n * GOLDEN_ANGLE
            + seed * TAU
            + k * (config.angle_step + seed * config.angle_seed_factor);

        let left = config.center.x + radius * theta.cos();
        let top = config.center.y + config.vertical_squash * radius * theta.sin();
        let (left, top) = config.safe_region.clamp(left, top);

        Placement::new(left, top, config.rotation_for(seed))
    }
}

/// A fixed table of slots. Indices past the end of the table wrap around,
/// so this only stays collision free for as many cards as there are slots.
#[derive(Debug, Clone)]
pub struct FixedSlots {
    slots: Vec<Placement>,
}

impl FixedSlots {
    pub fn new(slots: Vec<Placement>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Placement] {
        &self.slots
    }
}

impl Default for FixedSlots {
    fn default() -> Self {
        Self::new(
            DEFAULT_SLOTS
                .iter()
                .map(|&(left, top, rotate)| Placement::new(left, top, rotate))
                .collect(),
        )
    }
}

impl PositionStrategy for FixedSlots {
    fn candidate(&self, config: &LayoutConfig, index: usize, _seed: Seed, attempt: u32) -> Placement {
        let slot = (!self.slots.is_empty())
            .then(|| self.slots[(index + attempt as usize) % self.slots.len()]);
        slot_candidate(config, slot)
    }
}

/// Clamps `slot` into the safe region. With no slot the card sits at the
/// center, untilted.
fn slot_candidate(config: &LayoutConfig, slot: Option<Placement>) -> Placement {
    match slot {
        Some(slot) => {
            let (left, top) = config.safe_region.clamp(slot.left, slot.top);
            Placement::new(left, top, slot.rotation_degrees)
        }
        None => {
            let (left, top) = config.safe_region.clamp(config.center.x, config.center.y);
            Placement::new(left, top, 0.0)
        }
    }
}

/// Uniform scatter over the safe region. Draws come from a generator seeded
/// by `(seed, index, attempt)`, so the result is still reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct PureRandom;

impl PositionStrategy for PureRandom {
    fn candidate(&self, config: &LayoutConfig, index: usize, seed: Seed, attempt: u32) -> Placement {
        let mut hasher = FxHasher::default();
        seed.value().to_bits().hash(&mut hasher);
        index.hash(&mut hasher);
        attempt.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let region = &config.safe_region;
        let left = region.min_x + rng.gen::<f64>() * (region.max_x - region.min_x);
        let top = region.min_y + rng.gen::<f64>() * (region.max_y - region.min_y);
        let (left, top) = region.clamp(left, top);

        Placement::new(left, top, config.rotation_for(rng.gen::<f64>()))
    }
}

/// Strategy selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Spiral,
    FixedSlots,
    PureRandom,
}

impl PositionStrategy for StrategyKind {
    fn candidate(&self, config: &LayoutConfig, index: usize, seed: Seed, attempt: u32) -> Placement {
        match self {
            StrategyKind::Spiral => Spiral.candidate(config, index, seed, attempt),
            StrategyKind::FixedSlots => {
                let (left, top, rotate) = DEFAULT_SLOTS[(index + attempt as usize) % DEFAULT_SLOTS.len()];
                slot_candidate(config, Some(Placement::new(left, top, rotate)))
            }
            StrategyKind::PureRandom => PureRandom.candidate(config, index, seed, attempt),
        }
    }
}

// ============================================================================
// Placed set
// ============================================================================

/// Rectangles already committed during one layout pass, in placement order.
#[derive(Debug, Clone, Default)]
pub struct PlacedSet {
    rects: Vec<PlacementRect>,
}

impl PlacedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rects: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, rect: PlacementRect) {
        self.rects.push(rect);
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacementRect> {
        self.rects.iter()
    }

    /// True when `rect` comes within `margin` of any placed rectangle.
    pub fn collides(&self, rect: &PlacementRect, margin: f64) -> bool {
        self.rects.iter().any(|placed| rect.collides(placed, margin))
    }
}

impl FromIterator<PlacementRect> for PlacedSet {
    fn from_iter<I: IntoIterator<Item = PlacementRect>>(iter: I) -> Self {
        Self {
            rects: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

/// One card's result from a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    pub index: usize,
    pub seed: Seed,
    pub placement: Placement,
    /// False when the attempt budget ran out and the card overlaps another.
    pub collision_free: bool,
}

#[derive(Debug, Clone)]
pub struct CardLayout<S = Spiral> {
    config: LayoutConfig,
    strategy: S,
}

impl CardLayout<Spiral> {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_strategy(config, Spiral)
    }
}

impl Default for CardLayout<Spiral> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<S: PositionStrategy> CardLayout<S> {
    pub fn with_strategy(config: LayoutConfig, strategy: S) -> Self {
        Self { config, strategy }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Position before any collision handling.
    pub fn base_position(&self, index: usize, seed: Seed) -> Placement {
        self.strategy.candidate(&self.config, index, seed, 0)
    }

    /// Position for card `index` that keeps clear of `placed`, or the base
    /// position when no clear spot turns up within the attempt budget.
    pub fn place(&self, index: usize, seed: Seed, placed: &PlacedSet) -> Placement {
        self.try_place(index, seed, placed).0
    }

    /// Like [`place`](Self::place), also reporting whether the result is
    /// collision free.
    pub fn try_place(&self, index: usize, seed: Seed, placed: &PlacedSet) -> (Placement, bool) {
        for attempt in 0..self.config.max_attempts {
            let candidate = self.strategy.candidate(&self.config, index, seed, attempt);
            let rect = candidate.rect(self.config.card);
            if !placed.collides(&rect, self.config.margin) {
                if attempt > 0 {
                    trace!(index, attempt, "card placed after retries");
                }
                return (candidate, true);
            }
        }

        trace!(
            index,
            attempts = self.config.max_attempts,
            placed = placed.len(),
            "no clear spot, keeping base position"
        );
        (self.base_position(index, seed), false)
    }

    /// Lays out `seeds` in order on an empty canvas.
    pub fn layout_seeds(&self, seeds: impl IntoIterator<Item = Seed>) -> Vec<CardPlacement> {
        let seeds = seeds.into_iter();
        let mut placed = PlacedSet::with_capacity(seeds.size_hint().0);
        let mut cards = Vec::with_capacity(seeds.size_hint().0);

        for (index, seed) in seeds.enumerate() {
            let (placement, collision_free) = self.try_place(index, seed, &placed);
            placed.push(placement.rect(self.config.card));
            cards.push(CardPlacement {
                index,
                seed,
                placement,
                collision_free,
            });
        }

        let overlapping = cards.iter().filter(|card| !card.collision_free).count();
        debug!(cards = cards.len(), overlapping, "layout pass finished");
        cards
    }

    /// Full layout pass over `records` in display order.
    pub fn layout(&self, records: &[MessageRecord]) -> Vec<CardPlacement> {
        self.layout_seeds(
            records
                .iter()
                .enumerate()
                .map(|(index, record)| record.seed(index)),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::id::seed_of;
    use crate::math::Dimensions;

    fn records(ids: &[i64]) -> Vec<MessageRecord> {
        ids.iter()
            .map(|&id| MessageRecord::new(id, &format!("guest {id}"), "hello", Utc::now()))
            .collect()
    }

    fn assert_in_bounds(config: &LayoutConfig, placement: &Placement) {
        let region = &config.safe_region;
        assert!(
            region.contains(placement.left, placement.top),
            "{placement:?} outside {region:?}"
        );
        assert!(placement.left + config.card.width <= 100.0);
        assert!(placement.top + config.card.height <= 100.0);
    }

    fn assert_no_overlap(config: &LayoutConfig, cards: &[CardPlacement]) {
        for (i, a) in cards.iter().enumerate() {
            for b in &cards[i + 1..] {
                let ra = a.placement.rect(config.card);
                let rb = b.placement.rect(config.card);
                assert!(
                    !ra.collides(&rb, config.margin),
                    "cards {} and {} overlap: {ra:?} {rb:?}",
                    a.index,
                    b.index
                );
            }
        }
    }

    #[test]
    fn golden_angle_matches_formula() {
        let expected = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        assert!((GOLDEN_ANGLE - expected).abs() < 1e-12);
    }

    #[test]
    fn first_card_sits_off_center() {
        let layout = CardLayout::new(LayoutConfig::default());
        let base = layout.base_position(0, Seed::new(0.0));
        // n = 1, r = 4, theta = golden angle
        let expected_left = 50.0 + 4.0 * GOLDEN_ANGLE.cos();
        let expected_top = 46.0 + 0.85 * 4.0 * GOLDEN_ANGLE.sin();
        assert!((base.left - expected_left).abs() < 1e-9);
        assert!((base.top - expected_top).abs() < 1e-9);
        assert_eq!(base.rotation_degrees, -12.0);
    }

    #[test]
    fn place_on_empty_canvas_is_base_position() {
        let layout = CardLayout::new(LayoutConfig::default());
        let seed = seed_of(17);
        assert_eq!(layout.place(4, seed, &PlacedSet::new()), layout.base_position(4, seed));
    }

    #[test]
    fn place_is_deterministic() {
        let layout = CardLayout::new(LayoutConfig::default());
        let placed: PlacedSet = layout
            .layout(&records(&[10, 20, 30]))
            .iter()
            .map(|card| card.placement.rect(layout.config().card))
            .collect();
        let first = layout.place(3, seed_of(40), &placed);
        let second = layout.place(3, seed_of(40), &placed);
        assert_eq!(first, second);
        assert_eq!(placed.len(), 3);
    }

    #[test]
    fn three_records_scenario() {
        let layout = CardLayout::new(LayoutConfig::default());
        let cards = layout.layout(&records(&[1, 2, 3]));
        assert_eq!(cards.len(), 3);
        for card in &cards {
            assert!(card.collision_free);
            assert_in_bounds(layout.config(), &card.placement);
        }
        assert_no_overlap(layout.config(), &cards);

        let again = layout.layout(&records(&[1, 2, 3]));
        for (a, b) in cards.iter().zip(&again) {
            assert_eq!(a.placement.left.to_bits(), b.placement.left.to_bits());
            assert_eq!(a.placement.top.to_bits(), b.placement.top.to_bits());
            assert_eq!(
                a.placement.rotation_degrees.to_bits(),
                b.placement.rotation_degrees.to_bits()
            );
        }
    }

    #[test]
    fn appending_a_record_recomputes_without_overlap() {
        let layout = CardLayout::new(LayoutConfig::default());
        let before = layout.layout(&records(&[1, 2, 3]));
        let after = layout.layout(&records(&[1, 2, 3, 4]));
        assert_eq!(after.len(), 4);
        assert_no_overlap(layout.config(), &after);
        // earlier cards see the same placed set, so they do not move
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.placement, b.placement);
        }
    }

    #[test]
    fn up_to_eight_cards_never_overlap() {
        let layout = CardLayout::new(LayoutConfig::default());
        for count in 1..=8_i64 {
            let small: Vec<i64> = (1..=count).collect();
            let stamped: Vec<i64> = (0..count).map(|k| 1_760_870_400_000 + k * 137).collect();
            for ids in [small, stamped] {
                let cards = layout.layout(&records(&ids));
                assert!(cards.iter().all(|card| card.collision_free), "{ids:?}");
                assert_no_overlap(layout.config(), &cards);
            }
        }
    }

    #[test]
    fn records_without_ids_still_lay_out() {
        let layout = CardLayout::new(LayoutConfig::default());
        let mut list = records(&[1, 2, 3, 4, 5]);
        for record in &mut list {
            record.id = None;
        }
        let cards = layout.layout(&list);
        assert_no_overlap(layout.config(), &cards);
        assert_eq!(cards[2].seed, seed_of("guest 3-2"));
    }

    #[test]
    fn saturated_canvas_falls_back_to_base_position() {
        let layout = CardLayout::new(LayoutConfig::default());
        let config = layout.config().clone();
        let region = config.safe_region;
        let span_x = region.max_x + config.card.width - region.min_x;
        let span_y = region.max_y + config.card.height - region.min_y;
        let (cols, rows) = (25, 20);
        let cell = Dimensions::new(span_x / cols as f64, span_y / rows as f64);

        let mut placed = PlacedSet::new();
        for row in 0..rows {
            for col in 0..cols {
                let left = region.min_x + col as f64 * cell.width;
                let top = region.min_y + row as f64 * cell.height;
                placed.push(PlacementRect::new(left, top, left + cell.width, top + cell.height));
            }
        }
        assert_eq!(placed.len(), 500);

        let seed = seed_of(99);
        let (placement, collision_free) = layout.try_place(12, seed, &placed);
        assert!(!collision_free);
        assert_eq!(placement, layout.base_position(12, seed));
        assert_in_bounds(&config, &placement);
    }

    #[test]
    fn long_lists_stay_in_bounds() {
        let config = LayoutConfig::default();
        let ids: Vec<i64> = (0..200).collect();
        let list = records(&ids);

        let spiral = CardLayout::new(config.clone()).layout(&list);
        let slots = CardLayout::with_strategy(config.clone(), FixedSlots::default()).layout(&list);
        let random = CardLayout::with_strategy(config.clone(), PureRandom).layout(&list);

        for cards in [&spiral, &slots, &random] {
            assert_eq!(cards.len(), 200);
            for card in cards.iter() {
                assert_in_bounds(&config, &card.placement);
                // slot table tilts reach 15 degrees
                assert!(card.placement.rotation_degrees.abs() <= 15.0);
            }
        }
    }

    #[test]
    fn fixed_slots_fill_their_table_first() {
        let layout = CardLayout::with_strategy(LayoutConfig::default(), FixedSlots::default());
        let cards = layout.layout(&records(&[1, 2, 3, 4, 5, 6, 7, 8]));
        for (card, slot) in cards.iter().zip(layout.strategy().slots()) {
            assert!(card.collision_free);
            assert_eq!(card.placement, *slot);
        }
        assert_no_overlap(layout.config(), &cards);
    }

    #[test]
    fn fixed_slots_retry_other_slots() {
        let layout = CardLayout::with_strategy(LayoutConfig::default(), FixedSlots::default());
        let slots = layout.strategy().slots().to_vec();
        let placed: PlacedSet = [slots[0].rect(layout.config().card)].into_iter().collect();
        assert_eq!(layout.place(0, Seed::default(), &placed), slots[1]);
    }

    #[test]
    fn slot_kind_walks_the_default_table() {
        let config = LayoutConfig::default();
        let table = FixedSlots::default();
        for index in 0..10 {
            for attempt in 0..10 {
                assert_eq!(
                    StrategyKind::FixedSlots.candidate(&config, index, Seed::default(), attempt),
                    table.candidate(&config, index, Seed::default(), attempt)
                );
            }
        }

        let empty = FixedSlots::new(Vec::new()).candidate(&config, 3, Seed::default(), 2);
        let (left, top) = config.safe_region.clamp(config.center.x, config.center.y);
        assert_eq!(empty, Placement::new(left, top, 0.0));
    }

    #[test]
    fn pure_random_is_reproducible() {
        let layout = CardLayout::with_strategy(LayoutConfig::default(), PureRandom);
        let list = records(&[5, 6, 7, 8]);
        assert_eq!(layout.layout(&list), layout.layout(&list));
        let a = layout.base_position(0, seed_of(5));
        let b = layout.base_position(0, seed_of(6));
        assert_ne!(a, b);
    }

    #[test]
    fn strategy_kind_dispatches() {
        let config = LayoutConfig::default();
        let seed = seed_of(3);
        assert_eq!(
            StrategyKind::Spiral.candidate(&config, 2, seed, 0),
            Spiral.candidate(&config, 2, seed, 0)
        );
        assert_eq!(
            StrategyKind::FixedSlots.candidate(&config, 2, seed, 1),
            FixedSlots::default().candidate(&config, 2, seed, 1)
        );
        let kind: StrategyKind = serde_json::from_str(r#""pure_random""#).unwrap();
        assert_eq!(kind, StrategyKind::PureRandom);
    }

    #[test]
    fn zero_attempts_returns_base_position() {
        let config = LayoutConfig::builder().max_attempts(0).build();
        let layout = CardLayout::new(config);
        let (placement, collision_free) = layout.try_place(0, seed_of(1), &PlacedSet::new());
        assert!(!collision_free);
        assert_eq!(placement, layout.base_position(0, seed_of(1)));
    }
}
