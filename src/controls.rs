//! Control surface: the envelope and effect sliders.
//!
//! Each slider is bound to one outbound event. Its value lives on a fixed
//! step grid between `min` and `max`, the way a range input behaves, and is
//! reported to the engine as the string the slider displays. The engine is
//! responsible for parsing and mapping it.

use crate::bridge::{events, BridgeError, EventBus};
use std::collections::BTreeMap;
use tracing::debug;

/// Static description of one slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Outbound event emitted on change.
    pub event: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

/// All sliders in display order.
pub const CONTROL_SPECS: [ControlSpec; 7] = [
    envelope(events::ATTACK, "Attack", 0.1),
    envelope(events::DECAY, "Decay", 0.3),
    envelope(events::SUSTAIN, "Sustain", 0.7),
    envelope(events::RELEASE, "Release", 0.4),
    envelope(events::DELAY_WET, "Delay wet", 0.0),
    amount(events::DIST_AMOUNT, "Dist"),
    amount(events::FM_AMOUNT, "FM"),
];

const fn envelope(event: &'static str, label: &'static str, default: f64) -> ControlSpec {
    ControlSpec {
        event,
        label,
        min: 0.0,
        max: 1.0,
        step: 0.01,
        default,
    }
}

const fn amount(event: &'static str, label: &'static str) -> ControlSpec {
    ControlSpec {
        event,
        label,
        min: 0.0,
        max: 16.0,
        step: 0.1,
        default: 0.0,
    }
}

/// A control event as it leaves the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub name: String,
    pub value: String,
}

/// A slider positioned on its step grid.
///
/// The position is stored as a step index so repeated nudges never drift
/// off the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    spec: ControlSpec,
    index: u32,
}

impl Slider {
    /// Creates a slider at its default value.
    pub fn new(spec: ControlSpec) -> Self {
        Self::with_value(spec, spec.default)
    }

    /// Creates a slider at `value`, snapped to the nearest step and clamped.
    pub fn with_value(spec: ControlSpec, value: f64) -> Self {
        let mut slider = Self { spec, index: 0 };
        slider.set_value(value);
        slider
    }

    pub fn spec(&self) -> &ControlSpec {
        &self.spec
    }

    /// Number of steps between `min` and `max`.
    pub fn step_count(&self) -> u32 {
        ((self.spec.max - self.spec.min) / self.spec.step).round() as u32
    }

    pub fn value(&self) -> f64 {
        (self.spec.min + self.index as f64 * self.spec.step).min(self.spec.max)
    }

    /// Moves the slider to the grid position nearest `value`.
    pub fn set_value(&mut self, value: f64) {
        let steps = ((value - self.spec.min) / self.spec.step).round();
        self.index = if steps.is_nan() || steps <= 0.0 {
            0
        } else {
            (steps as u32).min(self.step_count())
        };
    }

    /// Position between 0.0 (min) and 1.0 (max).
    pub fn fraction(&self) -> f64 {
        match self.step_count() {
            0 => 0.0,
            n => self.index as f64 / n as f64,
        }
    }

    /// The value as the slider reports it: shortest decimal form on the
    /// step grid, e.g. `"0.5"`, `"0.07"`, `"16"`.
    pub fn raw_value(&self) -> String {
        let formatted = format!("{:.*}", step_decimals(self.spec.step), self.value());
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }

    /// Moves by `delta` steps, stopping at the limits.
    ///
    /// Returns true if the position changed.
    pub fn nudge(&mut self, delta: i32) -> bool {
        let target = (self.index as i64 + delta as i64).clamp(0, self.step_count() as i64) as u32;
        let changed = target != self.index;
        self.index = target;
        changed
    }
}

/// Number of decimal places needed to show `step` exactly.
fn step_decimals(step: f64) -> usize {
    let text = format!("{}", step);
    text.split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// The full row of sliders.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSurface {
    sliders: Vec<Slider>,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self {
            sliders: CONTROL_SPECS.iter().copied().map(Slider::new).collect(),
        }
    }
}

impl ControlSurface {
    /// Creates the sliders, overriding defaults with `initial` values keyed
    /// by event name.
    pub fn from_initial(initial: &BTreeMap<String, f64>) -> Self {
        let sliders = CONTROL_SPECS
            .iter()
            .copied()
            .map(|spec| match initial.get(spec.event) {
                Some(&value) => Slider::with_value(spec, value),
                None => Slider::new(spec),
            })
            .collect();
        Self { sliders }
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    /// Finds a slider by its event name.
    pub fn get(&self, event: &str) -> Option<&Slider> {
        self.sliders.iter().find(|s| s.spec.event == event)
    }

    /// Moves slider `index` by `delta` steps and, if it moved, emits its
    /// event with the new raw value.
    ///
    /// Returns the emitted event, or `None` if the slider did not move.
    pub fn adjust(
        &mut self,
        index: usize,
        delta: i32,
        bus: &EventBus,
    ) -> Result<Option<ControlEvent>, BridgeError> {
        let Some(slider) = self.sliders.get_mut(index) else {
            return Ok(None);
        };
        if !slider.nudge(delta) {
            return Ok(None);
        }

        let event = ControlEvent {
            name: slider.spec.event.to_string(),
            value: slider.raw_value(),
        };
        debug!(event = %event.name, value = %event.value, "control emit");
        bus.emit(&event.name, &event.value)?;
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::mpsc;

    fn spec(event: &str) -> ControlSpec {
        *CONTROL_SPECS.iter().find(|s| s.event == event).unwrap()
    }

    #[test]
    fn test_specs_cover_every_control_event() {
        let names: Vec<&str> = CONTROL_SPECS.iter().map(|s| s.event).collect();
        assert_eq!(names, events::CONTROL_EVENTS.to_vec());
    }

    #[test]
    fn test_raw_value_formatting() {
        let attack = spec(events::ATTACK);
        assert_eq!(Slider::with_value(attack, 0.5).raw_value(), "0.5");
        assert_eq!(Slider::with_value(attack, 0.07).raw_value(), "0.07");
        assert_eq!(Slider::with_value(attack, 0.0).raw_value(), "0");
        assert_eq!(Slider::with_value(attack, 1.0).raw_value(), "1");

        let dist = spec(events::DIST_AMOUNT);
        assert_eq!(Slider::with_value(dist, 16.0).raw_value(), "16");
        assert_eq!(Slider::with_value(dist, 3.3).raw_value(), "3.3");
    }

    #[test]
    fn test_nudge_stays_on_grid() {
        let mut slider = Slider::with_value(spec(events::DECAY), 0.0);
        for _ in 0..7 {
            slider.nudge(1);
        }
        assert_eq!(slider.raw_value(), "0.07");
        slider.nudge(-2);
        assert_eq!(slider.raw_value(), "0.05");
    }

    #[test]
    fn test_values_clamped_to_range() {
        let sustain = spec(events::SUSTAIN);
        assert_eq!(Slider::with_value(sustain, 5.0).raw_value(), "1");
        assert_eq!(Slider::with_value(sustain, -1.0).raw_value(), "0");
        assert_eq!(Slider::with_value(sustain, f64::NAN).raw_value(), "0");

        let mut slider = Slider::with_value(sustain, 0.98);
        assert!(slider.nudge(10));
        assert_eq!(slider.value(), 1.0);
        assert!(!slider.nudge(1));
        assert_eq!(slider.fraction(), 1.0);
    }

    #[test]
    fn test_adjust_emits_current_value_unmodified() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        let _sub = bus
            .listen(events::FM_AMOUNT, move |evt| {
                tx.send(evt.payload.clone()).unwrap();
            })
            .unwrap();

        let mut surface = ControlSurface::default();
        let fm = surface
            .sliders()
            .iter()
            .position(|s| s.spec().event == events::FM_AMOUNT)
            .unwrap();

        for delta in [1, 5, -2, 10] {
            let sent = surface.adjust(fm, delta, &bus).unwrap().unwrap();
            let payload = rx.try_recv().unwrap();
            let current = surface.sliders()[fm].raw_value();
            assert_eq!(sent.value, current);
            assert_eq!(payload, Value::String(current));
        }
    }

    #[test]
    fn test_adjust_at_limit_does_not_emit() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel::<Value>();
        let _sub = bus
            .listen(events::DELAY_WET, move |evt| {
                tx.send(evt.payload.clone()).unwrap();
            })
            .unwrap();

        let mut surface = ControlSurface::default();
        let wet = surface
            .sliders()
            .iter()
            .position(|s| s.spec().event == events::DELAY_WET)
            .unwrap();

        // Delay wet starts at 0.
        assert_eq!(surface.adjust(wet, -1, &bus).unwrap(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(surface.adjust(99, 1, &bus).unwrap(), None);
    }

    #[test]
    fn test_initial_values_override_defaults() {
        let mut initial = BTreeMap::new();
        initial.insert(events::ATTACK.to_string(), 0.25);
        let surface = ControlSurface::from_initial(&initial);

        assert_eq!(surface.get(events::ATTACK).unwrap().raw_value(), "0.25");
        assert_eq!(surface.get(events::DECAY).unwrap().raw_value(), "0.3");
        assert_eq!(surface.len(), CONTROL_SPECS.len());
    }
}
