use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use events::DragEvent;
use services::{
    create_clipboard_backend, create_drag_detector, create_pointer_source, ClipboardBackend,
    ClipboardFileProbe, DragIntentDetector, PointerTracker, ShakeDetector,
};

#[derive(Parser, Debug)]
#[command(name = "dnd-rust")]
#[command(about = "Демон отслеживания указателя и определения перетаскивания файлов")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "dnd.toml")]
    config: String,

    /// Режим сухого запуска (без реальных устройств)
    #[arg(long)]
    dry_run: bool,

    /// Одноразовая проверка буфера обмена на файловую сигнатуру и выход
    #[arg(long)]
    check_now: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск DND Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные устройства не используются");
    } else {
        // Проверка прав доступа
        utils::permissions::check_permissions()?;
    }

    // Инициализация компонентов: бэкенд -> опрос -> детектор, источник -> трекер
    let backend = create_clipboard_backend(&config, args.dry_run)?;
    info!("Буфер обмена читается через {}", backend.name());
    let probe = Arc::new(ClipboardFileProbe::new(backend, &config));
    let detector = create_drag_detector(config.clone(), probe)?;

    if args.check_now {
        // Одноразовый синхронный опрос без запуска сервисов
        let has_files = detector.check_now();
        info!("Файловая сигнатура в буфере обмена: {}", has_files);
        return Ok(());
    }

    let source = create_pointer_source(config.clone(), args.dry_run)?;
    let tracker = Arc::new(PointerTracker::new(config.clone(), source));

    info!("Все компоненты инициализированы");

    // Хост реагирует на события детектора
    detector.subscribe(Box::new(|event: &DragEvent| match event {
        DragEvent::Start => info!("Перетаскивание: старт оптимистичной сессии"),
        DragEvent::End => info!("Перетаскивание: сессия завершена по тайм-ауту"),
        DragEvent::FilesDetected(paths) => {
            info!("Обнаружены файлы в буфере обмена: {:?}", paths)
        }
    }));

    tracker.subscribe_errors(|e| {
        warn!("Ошибка отслеживания указателя: {}", e);
    });

    // Жест встряхивания переводит детектор в оптимистичную сессию
    if config.shake.enabled {
        let shake = Mutex::new(ShakeDetector::new(&config.shake));
        let detector_for_shake = Arc::clone(&detector);
        tracker.subscribe_position(move |sample| {
            if shake.lock().feed(sample) {
                info!("Обнаружен жест встряхивания - оптимистичная активация");
                detector_for_shake.activate_optimistically();
            }
        });
    } else {
        info!("Жест встряхивания отключён конфигурацией");
    }

    // Запуск сервисов
    tracker.start()?;
    detector.start()?;

    info!(
        "Все сервисы запущены (отслеживание активно: {})",
        tracker.is_tracking()
    );

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    let metrics = tracker.metrics();
    info!(
        "Финальные метрики: частота {:.1} Гц, память {} байт",
        metrics.sample_frequency_hz, metrics.memory_bytes
    );
    info!("Последний сэмпл указателя: {}", tracker.current_position());

    if detector.is_dragging_files() {
        warn!("Сессия перетаскивания ещё активна на момент выхода");
    }

    // Полный демонтаж: таймеры сняты, подписки сброшены
    detector.shutdown();
    tracker.shutdown();

    info!("DND Rust завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
