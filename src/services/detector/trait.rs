use crate::config::Config;
use crate::error::{DndError, Result};
use crate::events::DragEvent;
use crate::services::probe::ClipboardFileProbe;
use crate::services::subscribers::{Callback, SubscriptionId};
use std::sync::Arc;

/// Trait for drag-intent detectors implementing different strategies
pub trait DragIntentDetector: Send + Sync {
    /// Allow the detector to accept activation requests
    fn start(&self) -> Result<()>;

    /// Stop accepting activations and cancel any active session
    fn stop(&self);

    /// Optimistically begin (or refresh) a drag session
    fn activate_optimistically(&self);

    /// Whether a drag session is currently considered active
    fn is_dragging_files(&self) -> bool;

    /// Synchronous one-shot probe, independent of state transitions
    fn check_now(&self) -> bool;

    fn subscribe(&self, callback: Callback<DragEvent>) -> SubscriptionId;

    #[allow(dead_code)]
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Teardown: stop and drop all subscriptions; safe to call multiple times
    fn shutdown(&self);
}

/// Factory function to create a drag detector based on the configured strategy
pub fn create_drag_detector(
    config: Arc<Config>,
    probe: Arc<ClipboardFileProbe>,
) -> Result<Arc<dyn DragIntentDetector>> {
    match config.detector.strategy.as_str() {
        "optimistic" => Ok(Arc::new(super::optimistic::OptimisticDetector::new(
            config, probe,
        ))),
        "continuous" => Ok(Arc::new(super::continuous::ContinuousDetector::new(probe))),
        other => Err(DndError::Internal(format!(
            "Неизвестная стратегия детекции: {}",
            other
        ))),
    }
}
