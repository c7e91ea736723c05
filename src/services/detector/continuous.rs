use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::DragEvent;
use crate::services::probe::ClipboardFileProbe;
use crate::services::subscribers::{Callback, SubscriberList, SubscriptionId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::r#trait::DragIntentDetector;

/// Стратегия непрерывного опроса: внутреннего состояния нет, каждый запрос
/// отвечает по свежему снимку буфера обмена. Подходит хосту, который сам
/// знает момент броска и хочет только мгновенный да/нет.
pub struct ContinuousDetector {
    probe: Arc<ClipboardFileProbe>,
    started: AtomicBool,
    subscribers: SubscriberList<DragEvent>,
}

impl ContinuousDetector {
    pub fn new(probe: Arc<ClipboardFileProbe>) -> Self {
        info!("Инициализация ContinuousDetector");

        Self {
            probe,
            started: AtomicBool::new(false),
            subscribers: SubscriberList::new(),
        }
    }
}

impl DragIntentDetector for ContinuousDetector {
    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("ContinuousDetector уже запущен - повторный start() игнорируется");
            return Ok(());
        }

        info!("ContinuousDetector запущен");
        Ok(())
    }

    fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            debug_if_enabled!("ContinuousDetector уже остановлен");
            return;
        }

        info!("ContinuousDetector остановлен");
    }

    fn activate_optimistically(&self) {
        // Таймеров и сессий нет, активация не требуется
        debug_if_enabled!("Непрерывная стратегия: оптимистичная активация не используется");
    }

    fn is_dragging_files(&self) -> bool {
        self.check_now()
    }

    fn check_now(&self) -> bool {
        self.probe.probe().has_file_signature
    }

    fn subscribe(&self, callback: Callback<DragEvent>) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn shutdown(&self) {
        self.stop();
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::probe::DryRunBackend;

    fn test_detector(positive: bool) -> ContinuousDetector {
        let config = Config::default();

        let backend = DryRunBackend::new();
        if positive {
            backend.set_formats(["public.file-url"]);
            backend.set_content("public.file-url", "file:///a.txt");
        }

        let probe = Arc::new(ClipboardFileProbe::new(Arc::new(backend), &config));
        ContinuousDetector::new(probe)
    }

    #[test]
    fn test_check_now_reflects_clipboard_state() {
        assert!(test_detector(true).check_now());
        assert!(!test_detector(false).check_now());
    }

    #[test]
    fn test_is_dragging_proxies_check_now() {
        let detector = test_detector(true);
        detector.start().unwrap();

        assert!(detector.is_dragging_files());
    }

    #[test]
    fn test_activation_is_a_no_op() {
        let detector = test_detector(false);
        detector.start().unwrap();

        detector.activate_optimistically();
        assert!(!detector.is_dragging_files());
    }
}
