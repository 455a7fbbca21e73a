use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A pointer event in the host's client coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub client_x: f64,
    pub client_y: f64,
    pub button: MouseButton,
}

impl MouseEvent {
    pub fn new(kind: MouseEventKind, client_x: f64) -> Self {
        Self {
            kind,
            client_x,
            client_y: 0.0,
            button: MouseButton::Left,
        }
    }

    pub fn down(client_x: f64) -> Self {
        Self::new(MouseEventKind::Down, client_x)
    }

    pub fn up(client_x: f64) -> Self {
        Self::new(MouseEventKind::Up, client_x)
    }

    pub fn moved(client_x: f64) -> Self {
        Self::new(MouseEventKind::Move, client_x)
    }

    pub fn enter(client_x: f64) -> Self {
        Self::new(MouseEventKind::Enter, client_x)
    }

    pub fn leave(client_x: f64) -> Self {
        Self::new(MouseEventKind::Leave, client_x)
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_y(mut self, client_y: f64) -> Self {
        self.client_y = client_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Esc,
}

/// A key plus modifiers, as matched against the shortcut keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub code: KeyCode,
    pub shift: bool,
    pub ctrl: bool,
}

impl KeyChord {
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            shift: false,
            ctrl: false,
        }
    }

    pub const fn shift(code: KeyCode) -> Self {
        Self {
            code,
            shift: true,
            ctrl: false,
        }
    }

    pub const fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            shift: false,
            ctrl: true,
        }
    }
}
