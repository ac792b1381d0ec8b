//! Keyboard and mouse state between frames.
//!
//! [`Input`] collects window events as they arrive and exposes them per frame:
//! keys that just went down and left-clicks with their cursor position. The
//! window loop drains it once per frame with
//! [`Input::begin_frame`].

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(btn: WinitMouseButton) -> Option<Self> {
        match btn {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the animation responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    Escape,
    Up,
    Down,
    R,
    S,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            other => KeyCode::Other(other as u32),
        }
    }
}

#[derive(Debug, Default)]
pub struct Input {
    keys_pressed: HashSet<KeyCode>,
    keys_held: HashSet<KeyCode>,
    /// Cursor positions of left-button presses since the last frame.
    clicks: Vec<Vec2>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key went down since the last frame (auto-repeat ignored).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Take the left-clicks gathered since the last call.
    pub fn take_clicks(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.clicks)
    }

    /// Clear per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.clicks.clear();
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if !self.keys_held.contains(&key) {
            self.keys_pressed.insert(key);
        }
        self.keys_held.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.clicks.push(self.mouse_position);
        }
    }

    /// Cursor position in physical pixels.
    pub fn move_cursor(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = KeyCode::from(code);
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if let Some(btn) = MouseButton::from_winit(*button) {
                    self.press_mouse(btn);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            _ => {}
        }
    }
}
