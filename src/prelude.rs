//! Everything a host needs in one import.
//!
//! ```rust
//! use greeting_tree::prelude::*;
//! ```

// Layout engine
pub use crate::engine::{
    CardLayout, CardPlacement, FixedSlots, PlacedSet, PositionStrategy, PureRandom, Spiral,
    StrategyKind,
};
pub use crate::layout::LayoutConfig;
pub use crate::math::{Dimensions, Placement, PlacementRect, SafeRegion, Vector2};
pub use crate::id::{seed_of, MessageId, Seed};

// Messages and storage
pub use crate::message::{MessageRecord, NewMessage};
pub use crate::store::{JsonFileStore, MemoryStore, MessageStore};
pub use crate::errors::{StoreError, ValidationError};

// Host
pub use crate::board::{Card, TreeBoard};

// HTTP store client (feature-gated)
#[cfg(feature = "net")]
pub use crate::net::HttpStore;
