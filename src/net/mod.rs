//! [`MessageStore`] over the board's REST API, for hosts that run apart from
//! the server.

mod http;

pub use http::{HttpConfig, Response};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::id::MessageId;
use crate::message::{MessageRecord, NewMessage};
use crate::store::MessageStore;
use http::encode_segment;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostMessage<'a> {
    name: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    visitor_token: Option<&'a str>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Created {
    message: MessageRecord,
}

pub struct HttpStore {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpStore {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            agent: http::agent(timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(
        &self,
        method: &str,
        path: &str,
        f: impl FnOnce(&mut HttpConfig) -> &mut HttpConfig,
    ) -> Result<Response, StoreError> {
        let url = self.url(path);
        debug!(method, %url, "store request");
        http::send(&self.agent, method, &url, f).map_err(|err| {
            warn!(method, %url, %err, "store request failed");
            StoreError::Unavailable(err)
        })
    }
}

fn unexpected(resp: &Response) -> StoreError {
    StoreError::Unavailable(format!("unexpected status {}: {}", resp.status(), resp.text()))
}

impl MessageStore for HttpStore {
    fn list_messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        let resp = self.request("GET", "/api/messages", |c| c)?;
        if !resp.is_success() {
            return Err(unexpected(&resp));
        }
        Ok(resp.json()?)
    }

    fn append_message(&mut self, draft: NewMessage) -> Result<MessageRecord, StoreError> {
        let (name, text) = draft.validate()?;
        let body = serde_json::to_vec(&PostMessage {
            name,
            message: text,
            visitor_token: draft.visitor_token.as_deref(),
        })?;
        let resp = self.request("POST", "/api/messages", |c| c.json_body(body))?;
        if !resp.is_success() {
            return Err(unexpected(&resp));
        }
        let created: Envelope<Created> = resp.json()?;
        Ok(created.data.message)
    }

    fn delete_all(&mut self, admin_key: &str) -> Result<(), StoreError> {
        let resp = self.request("DELETE", "/api/messages", |c| c.query("key", admin_key))?;
        match resp.status() {
            403 => Err(StoreError::Forbidden),
            _ if resp.is_success() => Ok(()),
            _ => Err(unexpected(&resp)),
        }
    }

    fn ensure_share_token(&mut self, id: &MessageId) -> Result<MessageRecord, StoreError> {
        let path = format!("/api/messages/{}/share", encode_segment(&id.to_string()));
        let resp = self.request("POST", &path, |c| c)?;
        match resp.status() {
            404 | 400 => Err(StoreError::NotFound),
            _ if resp.is_success() => {
                let shared: Envelope<Created> = resp.json()?;
                Ok(shared.data.message)
            }
            _ => Err(unexpected(&resp)),
        }
    }

    fn find_by_share_token(&self, token: &str) -> Result<Option<MessageRecord>, StoreError> {
        let path = format!("/api/messages/share/{}", encode_segment(token));
        let resp = self.request("GET", &path, |c| c)?;
        match resp.status() {
            404 => Ok(None),
            _ if resp.is_success() => {
                let found: Envelope<MessageRecord> = resp.json()?;
                Ok(Some(found.data))
            }
            _ => Err(unexpected(&resp)),
        }
    }

    fn messages_for_visitor(&self, visitor_token: &str) -> Result<Vec<MessageRecord>, StoreError> {
        let path = format!("/api/messages/share-tree/{}", encode_segment(visitor_token));
        let resp = self.request("GET", &path, |c| c)?;
        if !resp.is_success() {
            return Err(unexpected(&resp));
        }
        let tree: Envelope<Vec<MessageRecord>> = resp.json()?;
        Ok(tree.data)
    }
}
