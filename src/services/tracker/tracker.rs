use crate::config::Config;
use crate::error::{DndError, Result};
use crate::events::{now_ms, PointerSample};
use crate::services::subscribers::{SubscriberList, SubscriptionId};
use crate::{debug_if_enabled, trace_if_enabled};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{error, info, warn};

use super::perf::{PerfAccumulator, PerformanceMetrics};
use super::r#trait::{PointerSource, SampleSink};

/// Трекер указателя: владеет жизненным циклом сэмплирования.
///
/// Приём сэмплов и учёт производительности разделены: события приходят с
/// переменной (возможно очень высокой) частотой, а тик учёта дешёвый и
/// работает строго по расписанию независимо от потока событий.
pub struct PointerTracker {
    config: Arc<Config>,
    shared: Arc<TrackerShared>,
    source: Arc<dyn PointerSource>,
    tasks: Mutex<TrackerTasks>,
}

#[derive(Default)]
struct TrackerTasks {
    accounting: Option<JoinHandle<()>>,
    source: Option<JoinHandle<()>>,
}

pub(crate) struct TrackerShared {
    active: AtomicBool,
    last_sample: RwLock<Option<PointerSample>>,
    events_since_tick: AtomicU64,
    samples_total: AtomicU64,
    accounting_ticks: AtomicU64,
    perf: Mutex<PerfAccumulator>,
    metrics: RwLock<PerformanceMetrics>,
    position_subs: SubscriberList<PointerSample>,
    error_subs: SubscriberList<DndError>,
}

impl PointerTracker {
    pub fn new(config: Arc<Config>, source: Arc<dyn PointerSource>) -> Self {
        info!("Инициализация PointerTracker (источник: {})", source.name());

        Self {
            config,
            shared: Arc::new(TrackerShared {
                active: AtomicBool::new(false),
                last_sample: RwLock::new(None),
                events_since_tick: AtomicU64::new(0),
                samples_total: AtomicU64::new(0),
                accounting_ticks: AtomicU64::new(0),
                perf: Mutex::new(PerfAccumulator::new()),
                metrics: RwLock::new(PerformanceMetrics::default()),
                position_subs: SubscriberList::new(),
                error_subs: SubscriberList::new(),
            }),
            source,
            tasks: Mutex::new(TrackerTasks::default()),
        }
    }

    /// Запустить отслеживание: источник событий и тик учёта
    pub fn start(&self) -> Result<()> {
        if self
            .shared
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("PointerTracker уже запущен - повторный start() игнорируется");
            return Err(DndError::AlreadyActive("PointerTracker".to_string()));
        }

        info!("Запуск PointerTracker");

        let mut tasks = self.tasks.lock();

        // Тик учёта продолжает работать даже при полном отсутствии сэмплов
        let shared = Arc::clone(&self.shared);
        let period = Duration::from_millis(self.config.tracker.accounting_interval_ms);
        tasks.accounting = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                shared.account_tick();
            }
        }));

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        let sink = SampleSink::new(Arc::clone(&self.shared));
        tasks.source = Some(tokio::spawn(async move {
            if let Err(e) = source.run(sink).await {
                error!("Источник указателя завершился с ошибкой: {}", e);
                shared.ingest_error(e);
            }
        }));

        Ok(())
    }

    /// Остановить отслеживание; повторные вызовы безопасны
    pub fn stop(&self) {
        if !self.shared.active.swap(false, Ordering::SeqCst) {
            debug_if_enabled!("PointerTracker уже остановлен");
            return;
        }

        // Снимаем задачи атомарно до возврата: после останова не должен
        // сработать ни один колбэк
        let (accounting, source) = {
            let mut tasks = self.tasks.lock();
            (tasks.accounting.take(), tasks.source.take())
        };

        if let Some(handle) = accounting {
            handle.abort();
        }
        if let Some(handle) = source {
            handle.abort();
        }

        info!(
            "PointerTracker остановлен (всего сэмплов: {})",
            self.shared.samples_total.load(Ordering::Relaxed)
        );
    }

    /// Полный демонтаж: остановка плюс сброс всех подписок
    pub fn shutdown(&self) {
        self.stop();
        self.shared.position_subs.clear();
        self.shared.error_subs.clear();
    }

    pub fn is_tracking(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Последний принятый сэмпл или нулевой с текущим временем
    pub fn current_position(&self) -> PointerSample {
        (*self.shared.last_sample.read()).unwrap_or_else(PointerSample::zeroed_now)
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        *self.shared.metrics.read()
    }

    /// Точка приёма сэмплов для моста событий
    #[allow(dead_code)]
    pub fn on_sample(&self, x: f64, y: f64, full: Option<PointerSample>) {
        self.shared.ingest_sample(x, y, full);
    }

    /// Проброс ошибки слоя отслеживания подписчикам
    #[allow(dead_code)]
    pub fn on_error(&self, err: DndError) {
        self.shared.ingest_error(err);
    }

    pub fn subscribe_position<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PointerSample) + Send + Sync + 'static,
    {
        self.shared.position_subs.subscribe(Box::new(callback))
    }

    pub fn subscribe_errors<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DndError) + Send + Sync + 'static,
    {
        self.shared.error_subs.subscribe(Box::new(callback))
    }

    #[allow(dead_code)]
    pub fn unsubscribe_position(&self, id: SubscriptionId) -> bool {
        self.shared.position_subs.unsubscribe(id)
    }

    #[allow(dead_code)]
    pub fn samples_total(&self) -> u64 {
        self.shared.samples_total.load(Ordering::Relaxed)
    }

    #[allow(dead_code)]
    pub fn accounting_ticks(&self) -> u64 {
        self.shared.accounting_ticks.load(Ordering::Relaxed)
    }
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl TrackerShared {
    pub(crate) fn ingest_sample(&self, x: f64, y: f64, full: Option<PointerSample>) {
        // Мост обязан слать события только пока трекер активен
        if !self.active.load(Ordering::SeqCst) {
            return;
        }

        if !x.is_finite() || !y.is_finite() {
            warn!(
                "Отброшен сэмпл с нечисловыми координатами: x={}, y={}",
                x, y
            );
            return;
        }

        let mut sample = match full {
            Some(full) if full.is_finite() => full,
            Some(full) => {
                warn!("Отброшен сэмпл с нечисловыми координатами: {}", full);
                return;
            }
            None => {
                let buttons = (*self.last_sample.read())
                    .map(|prev| prev.buttons)
                    .unwrap_or_default();
                PointerSample::new(x, y, now_ms(), buttons)
            }
        };

        {
            let mut last = self.last_sample.write();
            if let Some(prev) = *last {
                // Метки времени монотонно неубывающие в рамках одного трекера
                if sample.timestamp_ms < prev.timestamp_ms {
                    sample.timestamp_ms = prev.timestamp_ms;
                }
            }
            *last = Some(sample);
        }

        self.events_since_tick.fetch_add(1, Ordering::Relaxed);
        self.samples_total.fetch_add(1, Ordering::Relaxed);

        trace_if_enabled!("Сэмпл указателя: {}", sample);

        // Подписчики уведомляются синхронно в том же такте доставки
        self.position_subs.notify(&sample);
    }

    pub(crate) fn ingest_error(&self, err: DndError) {
        warn!("Ошибка слоя отслеживания: {}", err);
        self.error_subs.notify(&err);
    }

    fn account_tick(&self) {
        let events = self.events_since_tick.swap(0, Ordering::Relaxed);
        let snapshot = self.perf.lock().tick(events);
        *self.metrics.write() = snapshot;

        let tick_number = self.accounting_ticks.fetch_add(1, Ordering::Relaxed) + 1;
        debug_if_enabled!(
            "Тик учёта #{}: частота {:.1} Гц, память {} байт",
            tick_number,
            snapshot.sample_frequency_hz,
            snapshot.memory_bytes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ButtonMask;

    struct NullSource;

    #[async_trait::async_trait]
    impl PointerSource for NullSource {
        fn name(&self) -> &str {
            "null"
        }

        async fn run(&self, _sink: SampleSink) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn test_tracker() -> PointerTracker {
        PointerTracker::new(Arc::new(Config::default()), Arc::new(NullSource))
    }

    #[test]
    fn test_current_position_zeroed_before_first_sample() {
        let tracker = test_tracker();

        let position = tracker.current_position();
        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 0.0);
        assert!(position.buttons.is_empty());
        assert!(!tracker.is_tracking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_non_finite_samples() {
        let tracker = test_tracker();
        tracker.start().unwrap();

        tracker.on_sample(10.0, 20.0, None);
        tracker.on_sample(f64::NAN, 5.0, None);
        tracker.on_sample(5.0, f64::INFINITY, None);

        let position = tracker.current_position();
        assert_eq!(position.x, 10.0);
        assert_eq!(position.y, 20.0);
        assert_eq!(tracker.samples_total(), 1);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_accounting_timer() {
        let tracker = test_tracker();

        tracker.start().unwrap();
        let second = tracker.start();
        assert!(matches!(second, Err(DndError::AlreadyActive(_))));

        // При двух таймерах тиков было бы вдвое больше
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(tracker.accounting_ticks(), 3);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_notified_synchronously() {
        let tracker = test_tracker();
        tracker.start().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        tracker.subscribe_position(move |sample| {
            seen_clone.lock().push(*sample);
        });

        tracker.on_sample(1.0, 2.0, None);

        // Без единой точки ожидания: доставка произошла в этом же такте
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].x, 1.0);
        assert_eq!(seen[0].y, 2.0);
        drop(seen);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_are_monotonic() {
        let tracker = test_tracker();
        tracker.start().unwrap();

        let first = PointerSample::new(1.0, 1.0, 1000, ButtonMask::default());
        tracker.on_sample(first.x, first.y, Some(first));

        let stale = PointerSample::new(2.0, 2.0, 500, ButtonMask::default());
        tracker.on_sample(stale.x, stale.y, Some(stale));

        let position = tracker.current_position();
        assert_eq!(position.x, 2.0);
        assert_eq!(position.timestamp_ms, 1000);
        assert_eq!(tracker.samples_total(), 2);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_callbacks_after_stop() {
        let tracker = test_tracker();
        tracker.start().unwrap();

        let positions = Arc::new(Mutex::new(0u32));
        let positions_clone = Arc::clone(&positions);
        tracker.subscribe_position(move |_| {
            *positions_clone.lock() += 1;
        });

        tracker.on_sample(1.0, 1.0, None);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let ticks_before = tracker.accounting_ticks();
        assert_eq!(ticks_before, 1);

        tracker.stop();
        assert!(!tracker.is_tracking());

        // Таймер учёта снят, приём сэмплов закрыт
        tracker.on_sample(2.0, 2.0, None);
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert_eq!(*positions.lock(), 1);
        assert_eq!(tracker.accounting_ticks(), ticks_before);
        assert_eq!(tracker.samples_total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_shutdown_are_idempotent() {
        let tracker = test_tracker();

        tracker.start().unwrap();
        tracker.stop();
        tracker.stop();
        tracker.shutdown();
        tracker.shutdown();

        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_errors_forwarded_to_subscribers() {
        let tracker = test_tracker();

        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = Arc::clone(&errors);
        tracker.subscribe_errors(move |err| {
            errors_clone.lock().push(err.to_string());
        });

        tracker.on_error(DndError::Internal("хук отвалился".to_string()));

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("хук отвалился"));
    }
}
