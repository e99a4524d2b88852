//! WhatsApp transports for the conversation engine.
//!
//! - **Cloud API** (`webhook`, `cloud`): webhook payload parsing, the
//!   subscription handshake, request signature checks and outbound text
//!   delivery through the Graph API.
//! - **Local bridge** (`bridge`, `sidecar`): a paired WhatsApp Web session
//!   run by a sidecar program, with QR/ready tracking and reconnect backoff.
//!
//! Both transports hand customer messages to an [`events::InboundHandler`]
//! together with the reply path of the channel they came from.

pub mod bridge;
pub mod cloud;
pub mod events;
pub mod sidecar;
pub mod webhook;

pub use bridge::{
    BridgeClient, BridgeError, BridgeEvent, BridgeRunner, BridgeSender, BridgeSnapshot,
    BridgeStatus, ReconnectPolicy,
};
pub use cloud::{CloudApiSender, DeliveryError};
pub use events::{Channel, InboundHandler, InboundHandlerError, InboundMessage};
pub use sidecar::SidecarBridgeClient;
