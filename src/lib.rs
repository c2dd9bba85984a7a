//! Greeting board with a tree view.
//!
//! Visitors leave a name and a short message; every message becomes a card
//! on the tree. [`engine::CardLayout`] decides where each card goes: a
//! golden-angle spiral around the crown, nudged outward until the card keeps
//! clear of the ones already placed.
//!
//! ```rust
//! use greeting_tree::prelude::*;
//!
//! let records = vec![
//!     MessageRecord::new(1, "Lan", "Happy day!", chrono::Utc::now()),
//!     MessageRecord::new(2, "Mai", "Best wishes", chrono::Utc::now()),
//! ];
//! let cards = CardLayout::new(LayoutConfig::default()).layout(&records);
//! assert_eq!(cards.len(), 2);
//! assert!(cards.iter().all(|card| card.collision_free));
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod errors;
pub mod id;
pub mod layout;
pub mod math;
pub mod message;
pub mod prelude;
pub mod store;

#[cfg(feature = "net")]
pub mod net;
#[cfg(feature = "server")]
pub mod server;

pub use board::{Card, TreeBoard};
pub use engine::{CardLayout, CardPlacement, PlacedSet, PositionStrategy};
pub use errors::{StoreError, ValidationError};
pub use id::{seed_of, MessageId, Seed};
pub use layout::LayoutConfig;
pub use math::{Placement, PlacementRect};
pub use message::{MessageRecord, NewMessage};
