use crate::config::Config;
use crate::error::{DndError, Result};
use crate::events::{now_ms, ButtonMask, PointerSample};
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, KeyCode, RelativeAxisCode};
use std::sync::Arc;
use tracing::{error, info};

use super::r#trait::{PointerSource, SampleSink};

pub struct EvdevPointerSource {
    device: tokio::sync::Mutex<Device>,
    device_name: String,
}

impl EvdevPointerSource {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Инициализация EvdevPointerSource");

        let device_path = DeviceFinder::find_pointer_device(&config.tracker.device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            DndError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        let device_name = device.name().unwrap_or("Unknown").to_string();
        info!("Устройство: {}", device_name);
        info!("Физический путь: {:?}", device.physical_path());

        // Без эксклюзивного захвата: трекер только наблюдает за событиями,
        // рабочий стол продолжает их получать
        Ok(Self {
            device: tokio::sync::Mutex::new(device),
            device_name,
        })
    }
}

#[async_trait::async_trait]
impl PointerSource for EvdevPointerSource {
    fn name(&self) -> &str {
        &self.device_name
    }

    async fn run(&self, sink: SampleSink) -> Result<()> {
        info!("EvdevPointerSource запущен, начинаем чтение событий");

        let mut device = self.device.lock().await;

        // REL события дают только смещения, позиция накапливается от точки запуска
        let mut x = 0.0f64;
        let mut y = 0.0f64;
        let mut buttons = ButtonMask::default();
        let mut pending = false;

        loop {
            // Обработка событий указателя (неблокирующая)
            let events_vec = match device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    sink.push_error(DndError::Io(e));
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            for event in events_vec {
                if event.event_type() == EventType::RELATIVE {
                    if event.code() == RelativeAxisCode::REL_X.0 {
                        x += event.value() as f64;
                        pending = true;
                    } else if event.code() == RelativeAxisCode::REL_Y.0 {
                        y += event.value() as f64;
                        pending = true;
                    }
                } else if event.event_type() == EventType::KEY {
                    let pressed = match event.value() {
                        0 => false,
                        1 => true,
                        // Аппаратные повторы не меняют маску кнопок
                        _ => continue,
                    };

                    if event.code() == KeyCode::BTN_LEFT.0 {
                        buttons.set(ButtonMask::LEFT, pressed);
                        pending = true;
                    } else if event.code() == KeyCode::BTN_RIGHT.0 {
                        buttons.set(ButtonMask::RIGHT, pressed);
                        pending = true;
                    } else if event.code() == KeyCode::BTN_MIDDLE.0 {
                        buttons.set(ButtonMask::MIDDLE, pressed);
                        pending = true;
                    }
                } else if event.event_type() == EventType::SYNCHRONIZATION && pending {
                    // SYN_REPORT закрывает пакет событий - отдаём один сэмпл
                    let sample = PointerSample::new(x, y, now_ms(), buttons);
                    sink.push_sample(x, y, Some(sample));
                    pending = false;
                }
            }

            // Небольшая задержка для предотвращения 100% загрузки CPU
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
        }
    }
}
