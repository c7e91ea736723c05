mod continuous;
mod optimistic;
mod r#trait;

pub use self::r#trait::{create_drag_detector, DragIntentDetector};
