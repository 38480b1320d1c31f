//! Transport-level errors: everything that can go wrong between a raw
//! websocket message and a dispatched [`crate::protocol::ClientAction`],
//! plus the core's own errors passed through unchanged.

use thiserror::Error;

use holdem_engine::EngineError;

/// Every way handling a client's message can fail before it produces a
/// [`crate::protocol::Reply`]. Wraps [`EngineError`] for failures the core
/// itself rejected; the remaining variants are rejected by the transport
/// layer before ever reaching a table actor.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("invalid name")]
    InvalidName,
    #[error("not seated at that table")]
    NotSeated,
    #[error("amount out of range")]
    AmountOutOfRange,
    #[error("message must be 1-200 characters")]
    InvalidChatMessage,
    #[error("table actor gone")]
    ActorGone,
}
