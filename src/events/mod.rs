pub mod drag;
pub mod pointer;

pub use drag::{DragEvent, DragPhase};
pub use pointer::{now_ms, ButtonMask, PointerSample};
