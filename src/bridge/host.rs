//! Loopback host standing in for the native synth engine.
//!
//! When no engine is attached the panel still needs someone to answer
//! `start-synth`. The loopback host does what the engine does when it finds
//! no MIDI input: it reports `ready` and then plays a fixed note pattern,
//! announcing each note as a `message` event. Control events are recorded
//! and logged but produce no sound.

use super::{events, BridgeError, EventBus, Subscription};
use crate::midi::{MidiNote, MAX_NOTE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Velocity used for every note of the pattern.
const PATTERN_VELOCITY: u8 = 100;

/// Timing and note pattern for the loopback host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Time each pattern note is held before the next one.
    pub note_interval_ms: u64,
    /// Notes played in order, then repeated.
    pub pattern: Vec<u8>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            note_interval_ms: 200,
            pattern: vec![60, 61, 63, 65, 71, 72],
        }
    }
}

impl HostSettings {
    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        if self.note_interval_ms == 0 {
            return Some("host.note_interval_ms must be greater than 0".into());
        }
        self.pattern
            .iter()
            .find(|&&n| n > MAX_NOTE)
            .map(|n| format!("host.pattern contains out-of-range note {}", n))
    }
}

/// Commands delivered to the worker thread.
enum HostCommand {
    Start,
    Shutdown,
}

/// Handle to a running loopback host.
///
/// Dropping the handle unregisters its listeners and joins the worker.
pub struct LoopbackHost {
    commands: Sender<HostCommand>,
    worker: Option<JoinHandle<()>>,
    received: Arc<Mutex<HashMap<String, String>>>,
    _subscriptions: Vec<Subscription>,
}

impl LoopbackHost {
    /// Registers the host on `bus` and starts its worker thread.
    pub fn spawn(bus: EventBus, settings: HostSettings) -> Result<Self, BridgeError> {
        let (commands, rx) = mpsc::channel::<HostCommand>();
        let received = Arc::new(Mutex::new(HashMap::new()));
        let mut subscriptions = Vec::with_capacity(events::CONTROL_EVENTS.len() + 1);

        let start_tx = commands.clone();
        subscriptions.push(bus.listen(events::START_SYNTH, move |evt| {
            debug!(payload = %evt.payload, "start-synth received");
            // The worker only goes away on shutdown, at which point nobody
            // is waiting for a reply.
            let _ = start_tx.send(HostCommand::Start);
        })?);

        for name in events::CONTROL_EVENTS {
            let received = Arc::clone(&received);
            subscriptions.push(bus.listen(name, move |evt| {
                match evt.payload_str() {
                    Some(value) => {
                        info!(control = %evt.name, value, "control changed");
                        if let Ok(mut map) = received.lock() {
                            map.insert(evt.name.clone(), value.to_string());
                        }
                    }
                    None => {
                        warn!(control = %evt.name, payload = %evt.payload, "non-string control value")
                    }
                }
            })?);
        }

        let worker = std::thread::Builder::new()
            .name("loopback-host".into())
            .spawn(move || run_worker(bus, settings, rx))?;

        Ok(Self {
            commands,
            worker: Some(worker),
            received,
            _subscriptions: subscriptions,
        })
    }

    /// Last raw value received for a control event.
    pub fn last_value(&self, control: &str) -> Option<String> {
        self.received
            .lock()
            .ok()
            .and_then(|map| map.get(control).cloned())
    }
}

impl Drop for LoopbackHost {
    fn drop(&mut self) {
        let _ = self.commands.send(HostCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("loopback host worker panicked");
            }
        }
    }
}

/// Worker loop: idle until started, then step through the pattern.
///
/// The command channel doubles as the pattern clock, so a shutdown request
/// interrupts the current note immediately.
fn run_worker(bus: EventBus, settings: HostSettings, rx: mpsc::Receiver<HostCommand>) {
    let interval = Duration::from_millis(settings.note_interval_ms.max(1));
    let mut playing = false;
    let mut step = 0usize;

    loop {
        let command = if playing {
            match rx.recv_timeout(interval) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        match command {
            Some(HostCommand::Shutdown) => break,
            Some(HostCommand::Start) => {
                info!("engine ready");
                if let Err(e) = bus.emit(events::READY, true) {
                    warn!(error = %e, "failed to emit ready");
                }
                // Play the first note right away instead of after one interval.
                playing = !settings.pattern.is_empty();
                if playing {
                    play_step(&bus, &settings.pattern, &mut step);
                }
            }
            None => play_step(&bus, &settings.pattern, &mut step),
        }
    }
    debug!("loopback host stopped");
}

fn play_step(bus: &EventBus, pattern: &[u8], step: &mut usize) {
    let note = MidiNote::new(pattern[*step % pattern.len()], PATTERN_VELOCITY);
    *step = (*step + 1) % pattern.len();
    if let Err(e) = bus.emit(events::MESSAGE, note) {
        warn!(error = %e, "failed to emit note");
    }
}
