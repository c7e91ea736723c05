use crate::events::now_ms;
use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Метрики производительности трекера за последний тик учёта
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerformanceMetrics {
    pub sample_frequency_hz: f64,
    pub memory_bytes: u64,
    pub cpu_percent: f64,
    pub last_update_ms: u64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            sample_frequency_hz: 0.0,
            memory_bytes: 0,
            cpu_percent: 0.0,
            last_update_ms: 0,
        }
    }
}

/// Частота сэмплов за интервал; при нулевом интервале деления не происходит
pub fn sample_frequency(events: u64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    events as f64 * 1000.0 / elapsed_ms as f64
}

/// Накопитель учёта производительности.
///
/// Превращает счётчик сэмплов в периодическую метрику частоты и снимок
/// памяти процесса. Живёт ровно в одном экземпляре на трекер.
pub struct PerfAccumulator {
    last_tick: Instant,
    system: System,
    pid: Pid,
    ticks_total: u64,
}

impl PerfAccumulator {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Первичный refresh, чтобы далее снимать только дельты
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            last_tick: Instant::now(),
            system,
            pid,
            ticks_total: 0,
        }
    }

    /// Один тик учёта: пересчитать частоту и снять память процесса
    pub fn tick(&mut self, events: u64) -> PerformanceMetrics {
        let elapsed_ms = self.last_tick.elapsed().as_millis() as u64;
        self.last_tick = Instant::now();
        self.ticks_total += 1;

        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
        let memory_bytes = self
            .system
            .process(self.pid)
            .map(|process| process.memory())
            .unwrap_or(0);

        PerformanceMetrics {
            sample_frequency_hz: sample_frequency(events, elapsed_ms),
            memory_bytes,
            // Расчёт загрузки CPU не реализован, поле остаётся нулевым
            cpu_percent: 0.0,
            last_update_ms: now_ms(),
        }
    }

    #[allow(dead_code)]
    pub fn ticks_total(&self) -> u64 {
        self.ticks_total
    }
}

impl Default for PerfAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
