//! Messages client and client-side thread derivation.
//!
//! Messages are immutable once created. A "thread" is not a backend entity:
//! it is derived locally by grouping messages on the unordered pair of
//! participants, recomputed from scratch on every fetch. If the backend ever
//! grows a first-class conversation resource this derivation goes away.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::PaginationMeta;

/// A direct message as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub message_body: String,
    pub sent_datetime: NaiveDateTime,
}

/// One page of messages plus pagination metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesPage {
    pub messages: Vec<Message>,
    pub pagination: PaginationMeta,
}

/// Request payload for sending a message. `id` and `sent_datetime` are
/// server-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessage {
    pub sender: String,
    pub receiver: String,
    pub message_body: String,
}

/// The unordered pair of participants identifying a thread.
///
/// Construction sorts the two usernames, so `new(a, b) == new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey {
    first: String,
    second: String,
}

impl ThreadKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }

    /// The participant that is not `me`. Falls back to `first` for a
    /// self-thread.
    pub fn other(&self, me: &str) -> &str {
        if self.first == me {
            &self.second
        } else {
            &self.first
        }
    }
}

/// A derived thread: the participant pair and its most recent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub key: ThreadKey,
    pub latest: Message,
}

/// Group messages into threads keyed by the unordered participant pair.
///
/// The representative message of each group is the one with the maximum
/// `sent_datetime`; on a tie the earlier-seen message is kept. Threads come
/// back newest-first, which is the inbox display order.
pub fn group_threads(messages: &[Message]) -> Vec<Thread> {
    // Insertion-ordered so ties stay stable across runs.
    let mut order: Vec<Thread> = Vec::new();
    let mut index: HashMap<ThreadKey, usize> = HashMap::new();

    for message in messages {
        let key = ThreadKey::new(&message.sender, &message.receiver);
        match index.get(&key) {
            Some(&i) => {
                if message.sent_datetime > order[i].latest.sent_datetime {
                    order[i].latest = message.clone();
                }
            }
            None => {
                index.insert(key.clone(), order.len());
                order.push(Thread {
                    key,
                    latest: message.clone(),
                });
            }
        }
    }

    order.sort_by(|a, b| b.latest.sent_datetime.cmp(&a.latest.sent_datetime));
    order
}

/// Stateless client for the `/Messages` resource.
#[derive(Debug, Clone)]
pub struct MessagesClient {
    config: ApiConfig,
}

impl MessagesClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// All messages between two users, in either direction. Ordering is
    /// server-determined; sort by `sent_datetime` if you need chronology.
    pub fn build_between(&self, sender: &str, receiver: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!(
                "{}/Messages?sender={sender}&receiver={receiver}",
                self.config.base_url()
            ),
            headers: Vec::new(),
            body: None,
        }
    }

    /// All messages where `user` is sender or receiver.
    pub fn build_inbox(&self, user: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/Messages?user={user}", self.config.base_url()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_send(&self, input: &SendMessage) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/Messages", self.config.base_url()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }

    pub fn parse_between(&self, response: HttpResponse) -> Result<Vec<Message>, ApiError> {
        check_status(&response, 200, "Failed to fetch messages")?;
        let page: MessagesPage =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(page.messages)
    }

    pub fn parse_inbox(&self, response: HttpResponse) -> Result<Vec<Message>, ApiError> {
        check_status(&response, 200, "Failed to fetch inbox")?;
        let page: MessagesPage =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(page.messages)
    }

    pub fn parse_send(&self, response: HttpResponse) -> Result<Message, ApiError> {
        check_status(&response, 201, "Failed to send message")?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
