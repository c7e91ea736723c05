//! PointerTracker service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for observing raw
//! pointer state (position/buttons) and accounting the sampling rate. It MUST
//! NOT contain any drag-detection heuristics or clipboard logic. All drag
//! decisions are made exclusively by the detector service.

mod dry_source;
mod evdev_source;
mod perf;
mod tracker;
mod r#trait;

pub use perf::PerformanceMetrics;
pub use tracker::PointerTracker;
pub use self::r#trait::{create_pointer_source, PointerSource, SampleSink};
