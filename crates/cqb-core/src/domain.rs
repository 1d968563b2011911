use serde::Serialize;
use serde_json::Value;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// One quote row as returned by the brokerage (plazo, tasa, ultimoPrecio, ...).
///
/// There is no fixed schema: the record keeps whatever JSON the remote sent.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuoteRecord(pub Value);

impl QuoteRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}
