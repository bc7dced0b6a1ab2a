//! Input controls and device polling
//!
//! `Input` is a registry of named `Control`s. Every frame the stage manager
//! polls each control against an `InputDevice`, and behaviors read the
//! resulting state by key. `KeyboardMouse` is a device fed from winit
//! window events by the host.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::core::error::{RegistrationError, ResourceError, Result};

/// Source of raw device state, polled once per frame
pub trait InputDevice {
    /// Check if a keyboard key is currently held
    fn is_key_down(&self, key: KeyCode) -> bool;

    /// Check if a mouse button is currently held
    fn is_mouse_button_down(&self, button: MouseButton) -> bool;

    /// Cursor position in window coordinates, if known
    fn cursor_position(&self) -> Option<(f64, f64)> {
        None
    }
}

/// A physical input a control reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl Binding {
    fn is_active(&self, device: &dyn InputDevice) -> bool {
        match *self {
            Binding::Key(key) => device.is_key_down(key),
            Binding::Mouse(button) => device.is_mouse_button_down(button),
        }
    }
}

impl From<KeyCode> for Binding {
    fn from(key: KeyCode) -> Self {
        Binding::Key(key)
    }
}

impl From<MouseButton> for Binding {
    fn from(button: MouseButton) -> Self {
        Binding::Mouse(button)
    }
}

/// How a control turns bindings into a value
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// 1.0 while any binding is held, 0.0 otherwise
    Button(Vec<Binding>),
    /// -1.0, 0.0 or 1.0 from two opposing binding sets
    Axis {
        negative: Vec<Binding>,
        positive: Vec<Binding>,
    },
}

/// Polled state of a control for the current and previous frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    pub value: f32,
    pub previous: f32,
}

/// A named, polled input source
#[derive(Debug)]
pub struct Control {
    key: String,
    kind: ControlKind,
    state: Cell<ControlState>,
}

impl Control {
    /// Create a button control
    pub fn button<I, B>(key: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Binding>,
    {
        Self {
            key: key.into(),
            kind: ControlKind::Button(bindings.into_iter().map(Into::into).collect()),
            state: Cell::new(ControlState::default()),
        }
    }

    /// Create an axis control from negative and positive bindings
    pub fn axis<N, P, B>(key: impl Into<String>, negative: N, positive: P) -> Self
    where
        N: IntoIterator<Item = B>,
        P: IntoIterator<Item = B>,
        B: Into<Binding>,
    {
        Self {
            key: key.into(),
            kind: ControlKind::Axis {
                negative: negative.into_iter().map(Into::into).collect(),
                positive: positive.into_iter().map(Into::into).collect(),
            },
            state: Cell::new(ControlState::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    pub fn state(&self) -> ControlState {
        self.state.get()
    }

    /// Current value: 0/1 for buttons, -1..1 for axes
    pub fn value(&self) -> f32 {
        self.state.get().value
    }

    /// Check if the control is held this frame
    pub fn is_down(&self) -> bool {
        self.state.get().value != 0.0
    }

    /// Check if the control went down this frame
    pub fn was_pressed(&self) -> bool {
        let state = self.state.get();
        state.value != 0.0 && state.previous == 0.0
    }

    /// Check if the control went up this frame
    pub fn was_released(&self) -> bool {
        let state = self.state.get();
        state.value == 0.0 && state.previous != 0.0
    }

    /// Refresh the state from a device
    pub fn poll(&self, device: &dyn InputDevice) {
        let any_active = |bindings: &Vec<Binding>| bindings.iter().any(|b| b.is_active(device));

        let value = match &self.kind {
            ControlKind::Button(bindings) => {
                if any_active(bindings) {
                    1.0
                } else {
                    0.0
                }
            }
            ControlKind::Axis { negative, positive } => {
                let mut value = 0.0;
                if any_active(negative) {
                    value -= 1.0;
                }
                if any_active(positive) {
                    value += 1.0;
                }
                value
            }
        };

        let previous = self.state.get().value;
        if value != previous {
            trace!(control = %self.key, value, "Control changed");
        }
        self.state.set(ControlState { value, previous });
    }
}

/// Registry of controls keyed by name
#[derive(Debug, Default)]
pub struct Input {
    controls: HashMap<String, Rc<Control>>,
    cursor_position: Option<(f64, f64)>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a control, rejecting duplicate keys
    ///
    /// Returns the shared handle that `get_control` hands out for the key.
    pub fn add_control(&mut self, control: Control) -> Result<Rc<Control>> {
        if self.controls.contains_key(control.key()) {
            return Err(RegistrationError::DuplicateControl(control.key).into());
        }

        debug!(control = %control.key, "Control registered");
        let control = Rc::new(control);
        self.controls
            .insert(control.key().to_string(), Rc::clone(&control));
        Ok(control)
    }

    /// Get a control by its key
    pub fn get_control(&self, key: &str) -> Result<Rc<Control>> {
        self.controls
            .get(key)
            .cloned()
            .ok_or_else(|| ResourceError::ControlNotFound(key.to_string()).into())
    }

    /// Iterate all controls (no ordering guarantee)
    pub fn controls(&self) -> impl Iterator<Item = &Rc<Control>> {
        self.controls.values()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Cursor position captured by the last poll
    pub fn cursor_position(&self) -> Option<(f64, f64)> {
        self.cursor_position
    }

    /// Refresh every control from the device
    pub fn poll(&mut self, device: &dyn InputDevice) {
        for control in self.controls.values() {
            control.poll(device);
        }
        self.cursor_position = device.cursor_position();
    }
}

/// Keyboard and mouse state fed from window events
#[derive(Debug, Default)]
pub struct KeyboardMouse {
    pressed_keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    cursor_position: Option<(f64, f64)>,
}

impl KeyboardMouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process keyboard input event
    /// Returns true if the event was handled
    pub fn on_keyboard_input(&mut self, keycode: KeyCode, state: ElementState) -> bool {
        match state {
            ElementState::Pressed => {
                self.pressed_keys.insert(keycode);
            }
            ElementState::Released => {
                self.pressed_keys.remove(&keycode);
            }
        };
        true
    }

    /// Process mouse button event
    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
            }
        }
    }

    /// Process mouse movement event
    pub fn on_mouse_move(&mut self, position: (f64, f64)) {
        self.cursor_position = Some(position);
    }

    /// Release everything (useful when window loses focus)
    pub fn reset(&mut self) {
        self.pressed_keys.clear();
        self.mouse_buttons.clear();
    }
}

impl InputDevice for KeyboardMouse {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    fn cursor_position(&self) -> Option<(f64, f64)> {
        self.cursor_position
    }
}
