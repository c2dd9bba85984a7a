use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::{append_record, check_admin_key, ensure_share_token_in, MessageStore};
use crate::errors::StoreError;
use crate::id::MessageId;
use crate::message::{MessageRecord, NewMessage};

/// Vec-backed store. Used by tests and as a scratch store for demos.
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<MessageRecord>,
    admin_key: Option<String>,
    rng: StdRng,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<MessageRecord>) -> Self {
        Self {
            records,
            admin_key: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    /// Makes token generation reproducible.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryStore {
    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn append_message(&mut self, draft: NewMessage) -> Result<MessageRecord, StoreError> {
        append_record(&mut self.records, draft, Utc::now(), &mut self.rng)
    }

    fn delete_all(&mut self, admin_key: &str) -> Result<(), StoreError> {
        check_admin_key(self.admin_key.as_deref(), admin_key)?;
        self.records.clear();
        info!("all messages deleted");
        Ok(())
    }

    fn ensure_share_token(&mut self, id: &MessageId) -> Result<MessageRecord, StoreError> {
        ensure_share_token_in(&mut self.records, id, &mut self.rng).map(|(record, _)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_messages_list_in_order() {
        let mut store = MemoryStore::new().rng_seed(1);
        store.append_message(NewMessage::new("a", "first")).unwrap();
        store.append_message(NewMessage::new("b", "second")).unwrap();
        let names: Vec<String> = store
            .list_messages()
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn delete_all_needs_the_key() {
        let mut store = MemoryStore::new().admin_key("k").rng_seed(2);
        store.append_message(NewMessage::new("a", "b")).unwrap();
        assert!(matches!(store.delete_all("wrong"), Err(StoreError::Forbidden)));
        assert_eq!(store.list_messages().unwrap().len(), 1);
        store.delete_all("k").unwrap();
        assert!(store.list_messages().unwrap().is_empty());
    }

    #[test]
    fn lookups_by_token() {
        let mut store = MemoryStore::new().rng_seed(3);
        let mine = store
            .append_message(NewMessage::new("a", "one").visitor_token("visitor-1"))
            .unwrap();
        store
            .append_message(NewMessage::new("a", "two").visitor_token("visitor-1"))
            .unwrap();
        store.append_message(NewMessage::new("b", "three")).unwrap();

        assert_eq!(store.messages_for_visitor("visitor-1").unwrap().len(), 2);
        assert!(store.messages_for_visitor("nobody").unwrap().is_empty());

        let token = mine.share_token.clone().unwrap();
        assert_eq!(store.find_by_share_token(&token).unwrap(), Some(mine));
        assert_eq!(store.find_by_share_token("missing").unwrap(), None);
    }

    #[test]
    fn legacy_records_get_a_share_token_on_demand() {
        let legacy = MessageRecord::new(1, "Admin", "hi", Utc::now());
        let mut store = MemoryStore::with_records(vec![legacy]).rng_seed(4);
        let record = store.ensure_share_token(&MessageId::Int(1)).unwrap();
        let token = record.share_token.expect("token assigned");
        assert_eq!(
            store.find_by_share_token(&token).unwrap().and_then(|r| r.id),
            Some(MessageId::Int(1))
        );
    }
}
