//! Event bridge between the control surface and the synth engine.
//!
//! This module provides a named publish/subscribe channel. The UI emits
//! control events (`attack`, `start-synth`, ...) and listens for the
//! engine's `message` and `ready` events. It supports:
//! - Listening by event name with RAII unsubscription
//! - Emitting any serializable payload from any thread
//! - A loopback host that stands in for the native engine

mod bus;
pub mod host;

pub use bus::{EventBus, ListenerId, Subscription};
pub use host::{HostSettings, LoopbackHost};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Names of every event that crosses the bridge.
pub mod events {
    /// Inbound: a text line or a `{note, velocity}` object.
    pub const MESSAGE: &str = "message";
    /// Inbound: the engine finished loading.
    pub const READY: &str = "ready";

    /// Outbound: ask the engine to start.
    pub const START_SYNTH: &str = "start-synth";
    pub const ATTACK: &str = "attack";
    pub const DECAY: &str = "decay";
    pub const SUSTAIN: &str = "sustain";
    pub const RELEASE: &str = "release";
    pub const DELAY_WET: &str = "delay_wet";
    pub const DIST_AMOUNT: &str = "dist_amount";
    pub const FM_AMOUNT: &str = "fm_amount";

    /// Payload sent with `start-synth`.
    pub const START_PAYLOAD: &str = "start please";

    /// Every outbound event carrying a control value.
    pub const CONTROL_EVENTS: [&str; 7] = [
        ATTACK,
        DECAY,
        SUSTAIN,
        RELEASE,
        DELAY_WET,
        DIST_AMOUNT,
        FM_AMOUNT,
    ];
}

/// A named event with its JSON payload.
///
/// A missing payload is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub payload: Value,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Returns the payload as a string slice, if it is a JSON string.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_str()
    }
}

/// Errors raised by the event bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A thread panicked while holding the listener registry.
    #[error("event bus registry is poisoned")]
    Poisoned,

    /// The payload could not be turned into JSON.
    #[error("failed to encode payload for `{event}`")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// The loopback host worker thread could not be started.
    #[error("failed to start loopback host")]
    Spawn(#[from] std::io::Error),
}
