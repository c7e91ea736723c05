use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{now_ms, DragEvent, DragPhase};
use crate::services::probe::ClipboardFileProbe;
use crate::services::subscribers::{Callback, SubscriberList, SubscriptionId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant};
use tracing::{info, warn};

use super::r#trait::DragIntentDetector;

/// Оптимистичная стратегия: сессия перетаскивания открывается до появления
/// достоверного знания и закрывается только по тайм-ауту.
///
/// Надёжного нативного сигнала "началось перетаскивание" нет, поэтому детектор
/// активируется по внешнему триггеру (жест встряхивания) и ограничивает цену
/// ложного срабатывания фиксированным дедлайном.
pub struct OptimisticDetector {
    inner: Arc<DetectorInner>,
}

struct DetectorInner {
    config: Arc<Config>,
    probe: Arc<ClipboardFileProbe>,
    started: AtomicBool,
    session: Mutex<DragSession>,
    subscribers: SubscriberList<DragEvent>,
}

/// Состояние оптимистичной сессии.
///
/// Инвариант: в фазе OptimisticallyActive выставлены activated_at_ms и обе
/// задачи (опрос и дедлайн).
struct DragSession {
    phase: DragPhase,
    activated_at_ms: Option<u64>,
    deadline: Instant,
    poll_task: Option<JoinHandle<()>>,
    timeout_task: Option<JoinHandle<()>>,
}

impl DragSession {
    fn idle() -> Self {
        Self {
            phase: DragPhase::Idle,
            activated_at_ms: None,
            deadline: Instant::now(),
            poll_task: None,
            timeout_task: None,
        }
    }
}

impl OptimisticDetector {
    pub fn new(config: Arc<Config>, probe: Arc<ClipboardFileProbe>) -> Self {
        info!(
            "Инициализация OptimisticDetector (тайм-аут: {} мс, опрос: {} мс)",
            config.detector.deactivation_timeout_ms, config.probe.poll_interval_ms
        );

        Self {
            inner: Arc::new(DetectorInner {
                config,
                probe,
                started: AtomicBool::new(false),
                session: Mutex::new(DragSession::idle()),
                subscribers: SubscriberList::new(),
            }),
        }
    }

    #[allow(dead_code)]
    pub fn activated_at_ms(&self) -> Option<u64> {
        self.inner.session.lock().activated_at_ms
    }
}

impl DragIntentDetector for OptimisticDetector {
    fn start(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            warn!("OptimisticDetector уже запущен - повторный start() игнорируется");
            return Ok(());
        }

        info!("OptimisticDetector запущен");
        Ok(())
    }

    fn stop(&self) {
        if !self.inner.started.swap(false, Ordering::SeqCst) {
            debug_if_enabled!("OptimisticDetector уже остановлен");
            return;
        }

        self.inner.cancel_session();
        info!("OptimisticDetector остановлен");
    }

    fn activate_optimistically(&self) {
        if !self.inner.started.load(Ordering::SeqCst) {
            warn!("Запрос активации при остановленном детекторе - игнорируется");
            return;
        }

        let timeout = Duration::from_millis(self.inner.config.detector.deactivation_timeout_ms);

        {
            let mut session = self.inner.session.lock();
            session.deadline = Instant::now() + timeout;

            if session.phase == DragPhase::OptimisticallyActive {
                // Повторная активация продлевает дедлайн, drag-start не дублируется
                debug_if_enabled!("Сессия уже активна, дедлайн продлён");
                return;
            }

            session.phase = DragPhase::OptimisticallyActive;
            session.activated_at_ms = Some(now_ms());
            session.poll_task = Some(tokio::spawn(poll_loop(Arc::clone(&self.inner))));
            session.timeout_task = Some(tokio::spawn(timeout_loop(Arc::clone(&self.inner))));
        }

        info!("Оптимистичная активация: сессия перетаскивания началась");
        self.inner.subscribers.notify(&DragEvent::Start);
    }

    fn is_dragging_files(&self) -> bool {
        self.inner.session.lock().phase == DragPhase::OptimisticallyActive
    }

    fn check_now(&self) -> bool {
        // Одноразовый синхронный опрос, фазу сессии не меняет
        self.inner.probe.probe().has_file_signature
    }

    fn subscribe(&self, callback: Callback<DragEvent>) -> SubscriptionId {
        self.inner.subscribers.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    fn shutdown(&self) {
        self.stop();
        self.inner.subscribers.clear();
    }
}

impl Drop for OptimisticDetector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DetectorInner {
    /// Погасить активную сессию без событий; задачи снимаются до возврата
    fn cancel_session(&self) {
        let (poll, timeout) = {
            let mut session = self.session.lock();
            session.phase = DragPhase::Idle;
            session.activated_at_ms = None;
            (session.poll_task.take(), session.timeout_task.take())
        };

        if let Some(handle) = poll {
            handle.abort();
        }
        if let Some(handle) = timeout {
            handle.abort();
        }
    }
}

/// Периодический опрос буфера обмена внутри активной сессии
async fn poll_loop(inner: Arc<DetectorInner>) {
    let period = Duration::from_millis(inner.config.probe.poll_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;

        let result = inner.probe.probe();
        if result.has_file_signature {
            debug_if_enabled!(
                "Позитивный опрос буфера обмена: {} путей",
                result.file_paths.len()
            );
            // Позитивный опрос сессию не завершает - только тайм-аут
            inner
                .subscribers
                .notify(&DragEvent::FilesDetected(result.file_paths));
        }
    }
}

/// Дедлайн автодеактивации; повторная активация продлевает его
async fn timeout_loop(inner: Arc<DetectorInner>) {
    loop {
        let deadline = inner.session.lock().deadline;
        sleep_until(deadline).await;

        // Дедлайн могли продлить, пока задача спала
        let expired = inner.session.lock().deadline <= Instant::now();
        if expired {
            break;
        }
    }

    let poll = {
        let mut session = inner.session.lock();
        if session.phase != DragPhase::OptimisticallyActive {
            return;
        }
        session.phase = DragPhase::Idle;
        session.activated_at_ms = None;
        session.timeout_task = None;
        session.poll_task.take()
    };

    if let Some(handle) = poll {
        handle.abort();
    }

    info!("Тайм-аут оптимистичной сессии: перетаскивание завершено");
    inner.subscribers.notify(&DragEvent::End);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::probe::DryRunBackend;

    fn test_detector(positive: bool) -> (OptimisticDetector, Arc<Mutex<Vec<DragEvent>>>) {
        let config = Arc::new(Config::default());

        let backend = DryRunBackend::new();
        if positive {
            backend.set_formats(["text/uri-list"]);
            backend.set_content("text/uri-list", "file:///a.txt");
        }

        let probe = Arc::new(ClipboardFileProbe::new(Arc::new(backend), &config));
        let detector = OptimisticDetector::new(config, probe);

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        detector.subscribe(Box::new(move |event: &DragEvent| {
            events_clone.lock().push(event.clone());
        }));

        (detector, events)
    }

    fn count_starts(events: &[DragEvent]) -> usize {
        events.iter().filter(|e| **e == DragEvent::Start).count()
    }

    fn count_ends(events: &[DragEvent]) -> usize {
        events.iter().filter(|e| **e == DragEvent::End).count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_start_then_timeout_end() {
        let (detector, events) = test_detector(false);
        detector.start().unwrap();

        detector.activate_optimistically();
        assert!(detector.is_dragging_files());
        assert_eq!(count_starts(&events.lock()), 1);
        assert!(detector.activated_at_ms().is_some());

        // До дедлайна сессия держится
        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(count_ends(&events.lock()), 0);
        assert!(detector.is_dragging_files());

        // Сразу после дедлайна приходит ровно один drag-end
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count_ends(&events.lock()), 1);
        assert!(!detector.is_dragging_files());
        assert!(detector.activated_at_ms().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_extends_deadline_without_second_start() {
        let (detector, events) = test_detector(false);
        detector.start().unwrap();

        detector.activate_optimistically();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        detector.activate_optimistically();

        assert_eq!(count_starts(&events.lock()), 1);

        // Старый дедлайн (3000 мс) уже прошёл бы, но сессия продлена
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(count_ends(&events.lock()), 0);
        assert!(detector.is_dragging_files());

        // Новый дедлайн: 1500 + 3000 = 4500 мс от начала
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(count_ends(&events.lock()), 1);
        assert_eq!(count_starts(&events.lock()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_probe_emits_files_without_ending_session() {
        let (detector, events) = test_detector(true);
        detector.start().unwrap();

        detector.activate_optimistically();
        tokio::time::sleep(Duration::from_millis(250)).await;

        {
            let events = events.lock();
            let detected: Vec<_> = events
                .iter()
                .filter_map(|e| match e {
                    DragEvent::FilesDetected(paths) => Some(paths.clone()),
                    _ => None,
                })
                .collect();

            assert!(!detected.is_empty());
            assert_eq!(detected[0], vec!["file:///a.txt".to_string()]);
            // Позитивный опрос не закрывает сессию
            assert_eq!(count_ends(&events), 0);
        }
        assert!(detector.is_dragging_files());

        // Полный тайм-аут сохраняется несмотря на подтверждённые файлы
        tokio::time::sleep(Duration::from_millis(2800)).await;
        assert_eq!(count_ends(&events.lock()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_events_after_stop() {
        let (detector, events) = test_detector(true);
        detector.start().unwrap();

        detector.activate_optimistically();
        detector.stop();

        tokio::time::sleep(Duration::from_millis(5000)).await;

        let events = events.lock();
        assert_eq!(count_starts(&events), 1);
        assert_eq!(count_ends(&events), 0);
        assert!(events
            .iter()
            .all(|e| !matches!(e, DragEvent::FilesDetected(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_ignored_while_stopped() {
        let (detector, events) = test_detector(false);

        detector.activate_optimistically();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(events.lock().is_empty());
        assert!(!detector.is_dragging_files());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_now_does_not_change_phase() {
        let (detector, events) = test_detector(true);
        detector.start().unwrap();

        assert!(detector.check_now());
        assert!(!detector.is_dragging_files());
        assert!(events.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent_and_drops_subscriptions() {
        let (detector, events) = test_detector(false);
        detector.start().unwrap();
        detector.activate_optimistically();

        detector.shutdown();
        detector.shutdown();

        // Подписки сброшены: повторный цикл не доставляет события
        detector.start().unwrap();
        detector.activate_optimistically();
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(count_starts(&events.lock()), 1);
        assert_eq!(count_ends(&events.lock()), 0);
    }
}
