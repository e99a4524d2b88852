use std::sync::{Arc, Mutex};

use async_trait::async_trait;

/// Outbound text delivery to a customer's phone.
///
/// Implementations log their own failures; a send never fails from the
/// caller's point of view and the engine records every attempted reply.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, text: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub text: String,
}

/// Keeps every send in memory. Used by the CLI dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<SentMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, to: &str, text: &str) {
        let message = SentMessage { to: to.to_string(), text: text.to_string() };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageSender, RecordingSender};

    #[tokio::test]
    async fn recording_sender_keeps_send_order() {
        let sender = RecordingSender::default();
        sender.send("5511999999999", "primeira").await;
        sender.send("5511999999999", "segunda").await;

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "primeira");
        assert_eq!(sent[1].to, "5511999999999");
    }
}
