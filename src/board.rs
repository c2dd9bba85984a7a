use rand::Rng;
use tracing::{info, warn};

use crate::engine::{CardLayout, CardPlacement, PositionStrategy, Spiral};
use crate::errors::StoreError;
use crate::math::{PlacementRect, Vector2};
use crate::message::{fallback_messages, MessageRecord, NewMessage};
use crate::store::MessageStore;

/// A message and where its card sits on the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub record: MessageRecord,
    pub layout: CardPlacement,
    pub rect: PlacementRect,
}

/// Keeps the tree view in sync with a store: loads messages, lays them out
/// and re-runs the layout after every change.
pub struct TreeBoard<St, S = Spiral> {
    store: St,
    layout: CardLayout<S>,
    cards: Vec<Card>,
    using_fallback: bool,
}

impl<St: MessageStore> TreeBoard<St, Spiral> {
    pub fn new(store: St) -> Self {
        Self::with_layout(store, CardLayout::default())
    }
}

impl<St: MessageStore, S: PositionStrategy> TreeBoard<St, S> {
    pub fn with_layout(store: St, layout: CardLayout<S>) -> Self {
        Self {
            store,
            layout,
            cards: Vec::new(),
            using_fallback: false,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// True when the last refresh could not reach the store and the
    /// placeholder list is shown instead.
    pub fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    /// Reloads the message list and lays it out from scratch. An unreachable
    /// store shows the placeholder list; other errors are returned.
    pub fn refresh(&mut self) -> Result<&[Card], StoreError> {
        let records = match self.store.list_messages() {
            Ok(records) => {
                self.using_fallback = false;
                records
            }
            Err(err) if err.is_unavailable() => {
                warn!(%err, "message store unavailable, showing fallback messages");
                self.using_fallback = true;
                fallback_messages()
            }
            Err(err) => return Err(err),
        };
        self.relayout(records);
        Ok(&self.cards)
    }

    /// Stores a new message and refreshes the board.
    pub fn submit(&mut self, name: &str, text: &str) -> Result<MessageRecord, StoreError> {
        self.submit_draft(NewMessage::new(name, text))
    }

    pub fn submit_draft(&mut self, draft: NewMessage) -> Result<MessageRecord, StoreError> {
        let record = self.store.append_message(draft)?;
        self.refresh()?;
        Ok(record)
    }

    /// Deletes every message.
    pub fn clear(&mut self, admin_key: &str) -> Result<(), StoreError> {
        self.store.delete_all(admin_key)?;
        self.cards.clear();
        info!("board cleared");
        Ok(())
    }

    /// A card chosen uniformly at random.
    pub fn random_card(&self, rng: &mut impl Rng) -> Option<&Card> {
        if self.cards.is_empty() {
            return None;
        }
        self.cards.get(rng.gen_range(0..self.cards.len()))
    }

    /// The card under a canvas point. Later cards are drawn on top, so they
    /// win when cards overlap.
    pub fn card_at(&self, point: impl Into<Vector2>) -> Option<&Card> {
        let point = point.into();
        self.cards.iter().rev().find(|card| card.rect.contains(point))
    }

    fn relayout(&mut self, records: Vec<MessageRecord>) {
        let placements = self.layout.layout(&records);
        let card_size = self.layout.config().card;
        self.cards = records
            .into_iter()
            .zip(placements)
            .map(|(record, layout)| Card {
                rect: layout.placement.rect(card_size),
                record,
                layout,
            })
            .collect();
    }
}
