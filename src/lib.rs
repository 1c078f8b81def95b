//! synthpanel - A terminal control surface for a synthesizer engine.
//!
//! This library provides the panel's state, controls, event bridge and
//! rendering. The engine itself lives behind the event bridge.

pub mod app;
pub mod bridge;
pub mod button;
pub mod config;
pub mod controls;
pub mod keyboard;
pub mod midi;
pub mod ui;

// Re-export commonly used types
pub use app::{App, Focus, UiState};
pub use bridge::{Event, EventBus, LoopbackHost, Subscription};
pub use config::Config;
pub use controls::{ControlSurface, Slider};
