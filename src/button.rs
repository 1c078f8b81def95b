//! Generic pressable button.

use anyhow::Result;

/// Action run when a button is pressed.
pub type ButtonAction = Box<dyn FnMut() -> Result<()> + Send>;

/// A labeled button wrapping an action callback.
pub struct Button {
    label: String,
    action: ButtonAction,
}

impl Button {
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the action and returns its result.
    pub fn press(&mut self) -> Result<()> {
        (self.action)()
    }
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_press_runs_action_each_time() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut button = Button::new("Go", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        button.press().unwrap();
        button.press().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(button.label(), "Go");
    }

    #[test]
    fn test_press_returns_action_error() {
        let mut button = Button::new("Fail", || anyhow::bail!("engine unreachable"));
        let err = button.press().unwrap_err();
        assert_eq!(err.to_string(), "engine unreachable");
    }
}
