use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Текущее время в миллисекундах от эпохи Unix
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Битовая маска нажатых кнопок указателя
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonMask(pub u8);

impl ButtonMask {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;

    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_left(mut self, pressed: bool) -> Self {
        self.set(Self::LEFT, pressed);
        self
    }

    #[allow(dead_code)]
    pub fn with_right(mut self, pressed: bool) -> Self {
        self.set(Self::RIGHT, pressed);
        self
    }

    #[allow(dead_code)]
    pub fn with_middle(mut self, pressed: bool) -> Self {
        self.set(Self::MIDDLE, pressed);
        self
    }

    pub fn set(&mut self, button: u8, pressed: bool) {
        if pressed {
            self.0 |= button;
        } else {
            self.0 &= !button;
        }
    }

    pub fn left(&self) -> bool {
        self.0 & Self::LEFT != 0
    }

    pub fn right(&self) -> bool {
        self.0 & Self::RIGHT != 0
    }

    pub fn middle(&self) -> bool {
        self.0 & Self::MIDDLE != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn to_vec(&self) -> Vec<String> {
        let mut result = Vec::new();
        if self.left() { result.push("left".to_string()); }
        if self.right() { result.push("right".to_string()); }
        if self.middle() { result.push("middle".to_string()); }
        result
    }
}

impl fmt::Display for ButtonMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buttons = self.to_vec();
        if buttons.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", buttons.join("+"))
        }
    }
}

/// Один наблюдённый сэмпл состояния указателя
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
    pub buttons: ButtonMask,
}

impl PointerSample {
    pub fn new(x: f64, y: f64, timestamp_ms: u64, buttons: ButtonMask) -> Self {
        Self {
            x,
            y,
            timestamp_ms,
            buttons,
        }
    }

    /// Нулевой сэмпл с текущим временем, когда наблюдений ещё не было
    pub fn zeroed_now() -> Self {
        Self::new(0.0, 0.0, now_ms(), ButtonMask::default())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for PointerSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}) [{}] @{}",
            self.x, self.y, self.buttons, self.timestamp_ms
        )
    }
}
