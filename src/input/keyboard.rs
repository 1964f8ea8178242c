use tracing::debug;

use crate::{composition::model::ComponentId, store::scenes::SceneStore};

/// Key identity as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Character(char),
    Named(String),
}

/// Element that had focus when the key was pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusTarget {
    /// Editor surface or document body.
    #[default]
    Body,
    /// Single-line text input.
    TextInput,
    /// Multi-line text area.
    TextArea,
    /// Content-editable element.
    ContentEditable,
    /// Any other focusable element (buttons, sliders).
    Other,
}

impl FocusTarget {
    /// Whether the element consumes typed text, in which case editor shortcuts must not fire.
    pub fn accepts_text(self) -> bool {
        matches!(
            self,
            Self::TextInput | Self::TextArea | Self::ContentEditable
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub target: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: Key, target: FocusTarget) -> Self {
        Self { key, target }
    }
}

/// What the handler did with a key press.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The host should suppress the default browser behaviour.
    pub prevent_default: bool,
    /// Component removed by the press.
    pub deleted: Option<ComponentId>,
}

/// Global Delete/Backspace listener; exactly one per mounted editor.
#[derive(Clone, Debug, Default)]
pub struct KeyboardHandler {
    mounted: bool,
}

impl KeyboardHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening. Returns `false` if already listening.
    pub fn mount(&mut self) -> bool {
        let newly = !self.mounted;
        self.mounted = true;
        newly
    }

    /// Stop listening.
    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Delete the selected component on Delete/Backspace unless focus is in a text field.
    pub fn handle(&self, event: &KeyEvent, scenes: &mut SceneStore) -> KeyOutcome {
        if !self.mounted || !matches!(event.key, Key::Delete | Key::Backspace) {
            return KeyOutcome::default();
        }
        if event.target.accepts_text() || scenes.selected_object_id().is_none() {
            return KeyOutcome::default();
        }
        let deleted = scenes.delete_selected_component();
        debug!(?deleted, "delete key handled");
        KeyOutcome {
            prevent_default: true,
            deleted,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/keyboard.rs"]
mod tests;
