use crate::config::ShakeConfig;
use crate::debug_if_enabled;
use crate::events::PointerSample;
use std::collections::VecDeque;

/// Детектор жеста встряхивания: серия резких смен горизонтального
/// направления за короткое окно.
///
/// Чистая синхронная логика без таймеров: время берётся из меток сэмплов,
/// поэтому детектор одинаково работает с живым и эмулированным источником.
pub struct ShakeDetector {
    config: ShakeConfig,
    last_x: Option<f64>,
    direction: i8,
    travel: f64,
    reversals: VecDeque<u64>,
}

impl ShakeDetector {
    pub fn new(config: &ShakeConfig) -> Self {
        Self {
            config: config.clone(),
            last_x: None,
            direction: 0,
            travel: 0.0,
            reversals: VecDeque::new(),
        }
    }

    /// Скормить очередной сэмпл; true, когда жест распознан
    pub fn feed(&mut self, sample: &PointerSample) -> bool {
        let Some(last_x) = self.last_x else {
            self.last_x = Some(sample.x);
            return false;
        };

        let dx = sample.x - last_x;
        self.last_x = Some(sample.x);

        if dx == 0.0 {
            return false;
        }

        let direction: i8 = if dx > 0.0 { 1 } else { -1 };

        if self.direction == 0 {
            self.direction = direction;
            self.travel = dx.abs();
            return false;
        }

        if direction == self.direction {
            self.travel += dx.abs();
            return false;
        }

        // Разворот засчитывается только после достаточного пробега в
        // прежнем направлении - мелкий дребезг не считается
        if self.travel >= self.config.min_travel_px {
            self.reversals.push_back(sample.timestamp_ms);
        }
        self.direction = direction;
        self.travel = dx.abs();

        // Развороты за пределами окна выпадают из подсчёта
        let window_start = sample.timestamp_ms.saturating_sub(self.config.window_ms);
        while matches!(self.reversals.front(), Some(&ts) if ts < window_start) {
            self.reversals.pop_front();
        }

        if self.reversals.len() >= self.config.min_reversals as usize {
            debug_if_enabled!(
                "Жест встряхивания: {} разворотов за {} мс",
                self.reversals.len(),
                self.config.window_ms
            );
            self.reset();
            return true;
        }

        false
    }

    fn reset(&mut self) {
        self.reversals.clear();
        self.direction = 0;
        self.travel = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ButtonMask, PointerSample};

    fn sample(x: f64, timestamp_ms: u64) -> PointerSample {
        PointerSample::new(x, 100.0, timestamp_ms, ButtonMask::default())
    }

    fn detector() -> ShakeDetector {
        ShakeDetector::new(&ShakeConfig::default())
    }

    #[test]
    fn test_zigzag_triggers_shake() {
        let mut shake = detector();

        assert!(!shake.feed(&sample(0.0, 0)));
        assert!(!shake.feed(&sample(50.0, 50)));
        assert!(!shake.feed(&sample(0.0, 100)));
        assert!(!shake.feed(&sample(50.0, 150)));
        assert!(shake.feed(&sample(0.0, 200)));
    }

    #[test]
    fn test_straight_movement_does_not_trigger() {
        let mut shake = detector();

        for step in 0..50u64 {
            let moved = shake.feed(&sample(step as f64 * 30.0, step * 10));
            assert!(!moved);
        }
    }

    #[test]
    fn test_small_jitter_is_ignored() {
        let mut shake = detector();

        // Дребезг меньше min_travel_px не даёт разворотов
        for step in 0..40u64 {
            let x = if step % 2 == 0 { 0.0 } else { 5.0 };
            assert!(!shake.feed(&sample(x, step * 10)));
        }
    }

    #[test]
    fn test_slow_reversals_fall_out_of_window() {
        let mut shake = detector();

        assert!(!shake.feed(&sample(0.0, 0)));
        assert!(!shake.feed(&sample(50.0, 100)));
        assert!(!shake.feed(&sample(0.0, 1000)));
        assert!(!shake.feed(&sample(50.0, 2000)));
        assert!(!shake.feed(&sample(0.0, 3000)));
        assert!(!shake.feed(&sample(50.0, 4000)));
    }

    #[test]
    fn test_state_resets_after_trigger() {
        let mut shake = detector();

        for (x, ts) in [(0.0, 0), (50.0, 50), (0.0, 100), (50.0, 150)] {
            assert!(!shake.feed(&sample(x, ts)));
        }
        assert!(shake.feed(&sample(0.0, 200)));

        // После срабатывания подсчёт начинается заново
        assert!(!shake.feed(&sample(50.0, 250)));
        assert!(!shake.feed(&sample(0.0, 300)));
    }
}
