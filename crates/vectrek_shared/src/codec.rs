//! # Wire Codec
//!
//! Every [`ComponentMessage`] travels as one JSON object:
//!
//! ```text
//! { "entity": 7, "type": "SyncState", "payload": { ...type-specific... } }
//! ```
//!
//! The `type` discriminator is decoded explicitly into the closed
//! [`Payload`] enum. Unknown discriminators come back as
//! [`CodecError::UnknownType`]; transports log and drop those.

use crate::protocol::{ComponentMessage, EntityId, HelmInput, Payload, SyncState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The `type` field names a payload this build does not know.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The bytes are not a well-formed message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The envelope as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Target entity
    pub entity: EntityId,
    /// Payload discriminator
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific body
    pub payload: serde_json::Value,
}

impl TryFrom<&ComponentMessage> for WireMessage {
    type Error = CodecError;

    fn try_from(msg: &ComponentMessage) -> Result<Self, Self::Error> {
        let payload = match &msg.payload {
            Payload::HelmInput(input) => serde_json::to_value(input)?,
            Payload::SyncState(state) => serde_json::to_value(state)?,
        };
        Ok(Self {
            entity: msg.entity,
            kind: msg.payload.type_name().to_owned(),
            payload,
        })
    }
}

impl TryFrom<WireMessage> for ComponentMessage {
    type Error = CodecError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let payload = match wire.kind.as_str() {
            "HelmInput" => Payload::HelmInput(serde_json::from_value::<HelmInput>(wire.payload)?),
            "SyncState" => Payload::SyncState(serde_json::from_value::<SyncState>(wire.payload)?),
            _ => return Err(CodecError::UnknownType(wire.kind)),
        };
        Ok(Self {
            entity: wire.entity,
            payload,
        })
    }
}

/// Encodes a message into its wire bytes.
pub fn encode(msg: &ComponentMessage) -> Result<Vec<u8>, CodecError> {
    let wire = WireMessage::try_from(msg)?;
    Ok(serde_json::to_vec(&wire)?)
}

/// Decodes wire bytes into a message.
pub fn decode(bytes: &[u8]) -> Result<ComponentMessage, CodecError> {
    let wire: WireMessage = serde_json::from_slice(bytes)?;
    ComponentMessage::try_from(wire)
}
