use crate::config::Config;
use crate::error::{DndError, Result};
use crate::events::PointerSample;
use std::sync::Arc;

use super::tracker::TrackerShared;

/// Sink through which a pointer source delivers raw events to the tracker.
///
/// The source runs on its own task; every event is marshalled through this
/// handle into tracker state, so the tracker stays the single logical writer.
#[derive(Clone)]
pub struct SampleSink {
    shared: Arc<TrackerShared>,
}

impl SampleSink {
    pub(crate) fn new(shared: Arc<TrackerShared>) -> Self {
        Self { shared }
    }

    pub fn push_sample(&self, x: f64, y: f64, full: Option<PointerSample>) {
        self.shared.ingest_sample(x, y, full);
    }

    pub fn push_error(&self, err: DndError) {
        self.shared.ingest_error(err);
    }
}

/// Trait for pointer sources that can run in different modes
#[async_trait::async_trait]
pub trait PointerSource: Send + Sync {
    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Run the pointer source, delivering samples into the sink
    async fn run(&self, sink: SampleSink) -> Result<()>;
}

/// Factory function to create an appropriate pointer source based on the dry_run flag
pub fn create_pointer_source(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Arc<dyn PointerSource>> {
    if dry_run {
        Ok(Arc::new(super::dry_source::DryRunPointerSource::new()))
    } else {
        Ok(Arc::new(super::evdev_source::EvdevPointerSource::new(
            config,
        )?))
    }
}
