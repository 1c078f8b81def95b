//! Application state and event handling.
//!
//! The [`App`] is the root view. It owns the UI state, subscribes to the
//! engine's inbound events on mount and applies them once per frame, and
//! routes user input to the start button and the sliders.

use crate::bridge::{events, BridgeError, Event, EventBus, Subscription};
use crate::button::Button;
use crate::config::Config;
use crate::controls::ControlSurface;
use crate::keyboard::{self, KEY_COUNT};
use crate::midi::{note_to_name, MidiNote};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a status line stays on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// State driven by inbound events.
///
/// Owned by the root view and reset on every mount.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    /// Note the engine last reported.
    pub current_note: Option<u8>,
    /// Whether the engine reported `ready`.
    pub loaded: bool,
    /// Last text line from the engine.
    pub message: String,
}

/// A decoded `message` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    Note(MidiNote),
}

impl MessagePayload {
    /// Decodes a payload, or returns `None` if it has neither shape.
    pub fn decode(payload: &Value) -> Option<Self> {
        match payload {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Object(_) => serde_json::from_value::<MidiNote>(payload.clone())
                .ok()
                .filter(MidiNote::is_valid)
                .map(Self::Note),
            _ => None,
        }
    }
}

/// Which control has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    StartButton,
    Slider(usize),
}

/// Main application state.
pub struct App {
    bus: EventBus,
    state: UiState,
    pub controls: ControlSurface,
    start_button: Button,
    keyboard_base: Option<u8>,
    pub focus: Focus,
    inbound: Receiver<Event>,
    subscriptions: Vec<Subscription>,
    /// Status message to display (cleared after a timeout).
    pub status_message: Option<(String, Instant)>,
    pub should_quit: bool,
}

impl App {
    /// Mounts the root view on `bus`: builds the controls from `config` and
    /// subscribes to `message` and `ready`.
    pub fn mount(bus: EventBus, config: &Config) -> Result<Self, BridgeError> {
        let (inbound, subscriptions) = subscribe(&bus)?;

        let start_bus = bus.clone();
        let start_button = Button::new("Start synth", move || {
            start_bus.emit(events::START_SYNTH, events::START_PAYLOAD)?;
            Ok(())
        });

        info!("panel mounted");
        Ok(Self {
            bus,
            state: UiState::default(),
            controls: ControlSurface::from_initial(&config.controls),
            start_button,
            keyboard_base: Some(config.keyboard.base_note),
            focus: Focus::StartButton,
            inbound,
            subscriptions,
            status_message: None,
            should_quit: false,
        })
    }

    /// Unmounts the view, unregistering its listeners.
    pub fn unmount(self) {
        drop(self);
    }

    /// Drops the current subscriptions and state, then mounts again on the
    /// same bus. Slider positions are kept.
    pub fn remount(&mut self) -> Result<(), BridgeError> {
        // Unlisten first so the old handlers never see another event.
        self.subscriptions.clear();
        let (inbound, subscriptions) = subscribe(&self.bus)?;
        self.inbound = inbound;
        self.subscriptions = subscriptions;
        self.state = UiState::default();
        self.focus = Focus::StartButton;
        info!("panel remounted");
        Ok(())
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn start_button(&self) -> &Button {
        &self.start_button
    }

    /// Applies every inbound event queued since the last call.
    ///
    /// Returns the number of events applied.
    pub fn pump_events(&mut self) -> usize {
        let pending: Vec<Event> = self.inbound.try_iter().collect();
        for event in &pending {
            self.apply_event(event);
        }
        pending.len()
    }

    /// Applies one inbound event to the UI state.
    ///
    /// Malformed payloads are logged and dropped.
    pub fn apply_event(&mut self, event: &Event) {
        match event.name.as_str() {
            events::READY => {
                if !self.state.loaded {
                    info!("engine ready");
                }
                self.state.loaded = true;
            }
            events::MESSAGE => match MessagePayload::decode(&event.payload) {
                Some(MessagePayload::Text(text)) => {
                    self.state.message = text;
                }
                Some(MessagePayload::Note(note)) => {
                    self.state.current_note = Some(note.note);
                    self.state.message =
                        format!("Playing {} ({})", note_to_name(note.note), note.note);
                }
                None => {
                    warn!(payload = %event.payload, "ignoring malformed message payload");
                }
            },
            other => debug!(event = other, "ignoring unexpected event"),
        }
    }

    /// Presses the start button.
    pub fn press_start(&mut self) {
        match self.start_button.press() {
            Ok(()) => self.set_status("Starting synth..."),
            Err(e) => {
                warn!(error = %e, "start-synth failed");
                self.set_status(format!("Start failed: {}", e));
            }
        }
    }

    /// Moves the focused slider by `delta` steps.
    ///
    /// Sliders are hidden until the engine is loaded, so this does nothing
    /// before then.
    pub fn adjust_focused(&mut self, delta: i32) {
        let Focus::Slider(index) = self.focus else {
            return;
        };
        if !self.state.loaded {
            return;
        }
        if let Err(e) = self.controls.adjust(index, delta, &self.bus) {
            warn!(error = %e, "control emit failed");
            self.set_status(format!("Could not send control: {}", e));
        }
    }

    /// Activates the focused control.
    pub fn activate(&mut self) {
        if self.focus == Focus::StartButton {
            self.press_start();
        }
    }

    /// Number of focusable controls currently shown.
    fn focus_slots(&self) -> usize {
        if self.state.loaded {
            1 + self.controls.len()
        } else {
            1
        }
    }

    fn focus_index(&self) -> usize {
        match self.focus {
            Focus::StartButton => 0,
            Focus::Slider(i) => i + 1,
        }
    }

    fn set_focus_index(&mut self, index: usize) {
        self.focus = match index {
            0 => Focus::StartButton,
            i => Focus::Slider(i - 1),
        };
    }

    /// Moves focus to the next control, wrapping around.
    pub fn focus_next(&mut self) {
        let slots = self.focus_slots();
        let next = (self.focus_index() + 1) % slots;
        self.set_focus_index(next);
    }

    /// Moves focus to the previous control, wrapping around.
    pub fn focus_prev(&mut self) {
        let slots = self.focus_slots();
        let current = self.focus_index().min(slots - 1);
        let prev = (current + slots - 1) % slots;
        self.set_focus_index(prev);
    }

    /// Notes shown on the keyboard display.
    pub fn keys(&self) -> [u8; KEY_COUNT] {
        keyboard::keys(self.keyboard_base)
    }

    /// Index of the highlighted key, if any.
    pub fn selected_key(&self) -> Option<usize> {
        keyboard::selected_index(&self.keys(), self.state.current_note)
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears the status message if it has expired.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        debug!(listeners = self.subscriptions.len(), "panel unmounted");
    }
}

/// Subscribes to the inbound events, forwarding them into a channel the UI
/// thread drains.
fn subscribe(bus: &EventBus) -> Result<(Receiver<Event>, Vec<Subscription>), BridgeError> {
    let (tx, rx) = mpsc::channel();
    let mut subscriptions = Vec::with_capacity(2);
    for name in [events::MESSAGE, events::READY] {
        let tx = tx.clone();
        subscriptions.push(bus.listen(name, move |evt| {
            // The receiver only disappears while the view is being torn down.
            let _ = tx.send(evt.clone());
        })?);
    }
    Ok((rx, subscriptions))
}
