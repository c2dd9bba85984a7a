//! Message storage. The layout engine never talks to a store directly; the
//! board and the server read a snapshot and hand it to the engine.

mod json_file;
mod memory;
mod tokens;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use tokens::{hash_ip, random_token, unique_token};

use chrono::{DateTime, Utc};
use rand::Rng;
use rustc_hash::FxHashSet;
use tracing::info;

use crate::errors::StoreError;
use crate::id::MessageId;
use crate::message::{MessageRecord, NewMessage};

pub const VISITOR_TOKEN_LEN: usize = 12;
pub const SHARE_TOKEN_LEN: usize = 11;

pub trait MessageStore {
    /// All messages in display order.
    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError>;

    /// Validates and stores a new message.
    fn append_message(&mut self, draft: NewMessage) -> Result<MessageRecord, StoreError>;

    /// Removes every message. Needs the store's admin key.
    fn delete_all(&mut self, admin_key: &str) -> Result<(), StoreError>;

    /// Returns the message, giving it a share token first if it has none.
    fn ensure_share_token(&mut self, id: &MessageId) -> Result<MessageRecord, StoreError>;

    fn find_by_share_token(&self, token: &str) -> Result<Option<MessageRecord>, StoreError> {
        Ok(self
            .list_messages()?
            .into_iter()
            .find(|record| record.share_token.as_deref() == Some(token)))
    }

    /// Every message submitted under `visitor_token`.
    fn messages_for_visitor(&self, visitor_token: &str) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self
            .list_messages()?
            .into_iter()
            .filter(|record| record.visitor_token.as_deref() == Some(visitor_token))
            .collect())
    }
}

/// Rejects a delete unless `given` matches the configured key. Without a
/// configured key deletes are always refused.
pub(crate) fn check_admin_key(configured: Option<&str>, given: &str) -> Result<(), StoreError> {
    match configured {
        Some(key) if !key.is_empty() && key == given => Ok(()),
        _ => Err(StoreError::Forbidden),
    }
}

/// Epoch-millisecond id, bumped past the largest existing numeric id.
fn next_id(records: &[MessageRecord], now: DateTime<Utc>) -> Result<i64, StoreError> {
    let newest = records
        .iter()
        .filter_map(|record| record.id.as_ref().and_then(MessageId::as_int))
        .max();
    let now = now.timestamp_millis();
    match newest {
        Some(newest) if newest >= now => newest.checked_add(1).ok_or(StoreError::IdsExhausted(newest)),
        _ => Ok(now),
    }
}

/// Appends `draft` to `records`, assigning id, timestamp and tokens.
pub(crate) fn append_record(
    records: &mut Vec<MessageRecord>,
    draft: NewMessage,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Result<MessageRecord, StoreError> {
    let (name, text) = draft.validate()?;
    let id = next_id(records, now)?;

    let visitor_token = match &draft.visitor_token {
        Some(token) => token.clone(),
        None => {
            let existing: FxHashSet<&str> = records
                .iter()
                .filter_map(|record| record.visitor_token.as_deref())
                .collect();
            unique_token(rng, VISITOR_TOKEN_LEN, &existing)
        }
    };
    let share_token = {
        let existing: FxHashSet<&str> = records
            .iter()
            .filter_map(|record| record.share_token.as_deref())
            .collect();
        unique_token(rng, SHARE_TOKEN_LEN, &existing)
    };

    let record = MessageRecord {
        id: Some(MessageId::Int(id)),
        name: name.to_owned(),
        text: text.to_owned(),
        created_at: now,
        visitor_token: Some(visitor_token),
        share_token: Some(share_token),
        ip_hash: draft.client_ip.as_deref().map(hash_ip),
    };
    records.push(record.clone());

    info!(
        name = %record.name,
        visitor_token = record.visitor_token.as_deref().unwrap_or_default(),
        share_token = record.share_token.as_deref().unwrap_or_default(),
        total = records.len(),
        "message stored"
    );
    Ok(record)
}

/// Gives the record with `id` a share token if it lacks one. Returns the
/// record and whether `records` changed.
pub(crate) fn ensure_share_token_in(
    records: &mut [MessageRecord],
    id: &MessageId,
    rng: &mut impl Rng,
) -> Result<(MessageRecord, bool), StoreError> {
    let idx = records
        .iter()
        .position(|record| record.id.as_ref() == Some(id))
        .ok_or(StoreError::NotFound)?;

    if let Some(token) = &records[idx].share_token {
        info!(%id, token = %token, "reusing share token");
        return Ok((records[idx].clone(), false));
    }

    let token = {
        let existing: FxHashSet<&str> = records
            .iter()
            .filter_map(|record| record.share_token.as_deref())
            .collect();
        unique_token(rng, SHARE_TOKEN_LEN, &existing)
    };
    info!(%id, token = %token, "created share token");
    records[idx].share_token = Some(token);
    Ok((records[idx].clone(), true))
}
