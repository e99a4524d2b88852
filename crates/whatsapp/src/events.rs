use async_trait::async_trait;
use thiserror::Error;

use vendaflow_core::delivery::MessageSender;

/// Where an inbound message arrived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    CloudApi,
    Bridge,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloudApi => "cloud_api",
            Self::Bridge => "bridge",
        }
    }
}

/// A customer text message with the phone number normalized to digits only,
/// as used for lead identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub phone_number: String,
    pub text: String,
    pub channel: Channel,
    pub correlation_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("inbound message handling failed: {0}")]
pub struct InboundHandlerError(pub String);

/// Receives customer messages from either transport.
///
/// `sender` is the reply path of the transport the message arrived on.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle_inbound(
        &self,
        message: &InboundMessage,
        sender: &dyn MessageSender,
    ) -> Result<(), InboundHandlerError>;
}
