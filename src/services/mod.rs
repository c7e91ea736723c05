pub mod detector;
pub mod probe;
pub mod shake;
pub mod subscribers;
pub mod tracker;

pub use detector::{create_drag_detector, DragIntentDetector};
pub use probe::{create_clipboard_backend, ClipboardBackend, ClipboardFileProbe};
pub use shake::ShakeDetector;
pub use tracker::{create_pointer_source, PointerTracker};
