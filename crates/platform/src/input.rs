//! Keyboard and mouse state tracking.

use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// Per-frame snapshot of keyboard and mouse state.
///
/// Events are fed in from the window event handler; `begin_frame` clears the
/// transient (just-pressed / delta) state at the start of each frame.
#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    just_pressed_keys: HashSet<KeyCode>,
    pressed_buttons: HashSet<MouseButton>,
    cursor_position: (f32, f32),
    cursor_delta: (f32, f32),
    scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the transient state; call once at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.cursor_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn on_button_pressed(&mut self, button: MouseButton) {
        self.pressed_buttons.insert(button);
    }

    pub fn on_button_released(&mut self, button: MouseButton) {
        self.pressed_buttons.remove(&button);
    }

    pub fn on_cursor_moved(&mut self, x: f32, y: f32) {
        let (last_x, last_y) = self.cursor_position;
        self.cursor_delta.0 += x - last_x;
        self.cursor_delta.1 += y - last_y;
        self.cursor_position = (x, y);
    }

    pub fn on_scroll(&mut self, delta: f32) {
        self.scroll_delta += delta;
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Cursor movement accumulated since the last `begin_frame`.
    pub fn cursor_delta(&self) -> (f32, f32) {
        self.cursor_delta
    }

    /// Scroll movement accumulated since the last `begin_frame`.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn just_pressed_clears_on_begin_frame() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyG);
        assert!(input.was_key_pressed(KeyCode::KeyG));
        assert!(input.is_key_pressed(KeyCode::KeyG));

        input.begin_frame();
        assert!(!input.was_key_pressed(KeyCode::KeyG));
        assert!(input.is_key_pressed(KeyCode::KeyG));
    }

    #[test]
    fn repeat_events_do_not_retrigger_just_pressed() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::Space);
        input.begin_frame();
        input.on_key_pressed(KeyCode::Space);
        assert!(!input.was_key_pressed(KeyCode::Space));
    }

    #[test]
    fn cursor_delta_accumulates_and_resets() {
        let mut input = InputState::new();
        input.on_cursor_moved(10.0, 10.0);
        input.begin_frame();
        input.on_cursor_moved(14.0, 7.0);
        input.on_cursor_moved(16.0, 6.0);
        assert_eq!(input.cursor_delta(), (6.0, -4.0));

        input.begin_frame();
        assert_eq!(input.cursor_delta(), (0.0, 0.0));
    }
}
