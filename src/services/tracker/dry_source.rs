use crate::error::Result;
use crate::events::{now_ms, ButtonMask, PointerSample};
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use super::r#trait::{PointerSource, SampleSink};

/// Частота эмуляции движения, ~60 сэмплов в секунду
const EMULATION_PERIOD_MS: u64 = 16;

pub struct DryRunPointerSource;

impl DryRunPointerSource {
    pub fn new() -> Self {
        info!("Инициализация DryRunPointerSource");
        Self
    }
}

#[async_trait::async_trait]
impl PointerSource for DryRunPointerSource {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn run(&self, sink: SampleSink) -> Result<()> {
        info!("Dry-run режим - PointerSource работает в режиме эмуляции");

        let center_x = 640.0;
        let center_y = 360.0;
        let radius = 120.0;

        let mut angle = 0.0f64;
        let mut emitted = 0u64;
        let mut ticker = interval(Duration::from_millis(EMULATION_PERIOD_MS));

        loop {
            ticker.tick().await;

            let x = center_x + radius * angle.cos();
            let y = center_y + radius * angle.sin();

            let sample = PointerSample::new(x, y, now_ms(), ButtonMask::default());
            sink.push_sample(x, y, Some(sample));

            angle += 0.12;
            emitted += 1;

            if emitted % 128 == 0 {
                debug!("Dry-run: эмулировано {} сэмплов указателя", emitted);
            }
        }
    }
}
