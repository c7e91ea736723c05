use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Trait for clipboard backends that can run in different modes
pub trait ClipboardBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Quick availability check for backend auto-detection
    fn test(&self) -> Result<()>;

    /// Enumerate clipboard format identifiers currently offered
    fn formats(&self) -> Result<Vec<String>>;

    /// Read the clipboard content for a specific format
    fn read_format(&self, format: &str) -> Result<String>;

    /// Read the plain-text clipboard content
    fn read_text(&self) -> Result<String>;

    /// Read the rich/markup clipboard content (text/html)
    fn read_markup(&self) -> Result<String>;
}

/// Factory function to create an appropriate clipboard backend based on the
/// configuration and the dry_run flag
pub fn create_clipboard_backend(
    config: &Config,
    dry_run: bool,
) -> Result<Arc<dyn ClipboardBackend>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunBackend::new()));
    }

    match config.probe.backend.as_str() {
        "wl-paste" => Ok(Arc::new(super::wl_paste::WlPasteBackend::new())),
        "xclip" => Ok(Arc::new(super::xclip::XclipBackend::new())),
        _ => Ok(detect_working_backend()),
    }
}

fn detect_working_backend() -> Arc<dyn ClipboardBackend> {
    info!("Определяем рабочий инструмент чтения буфера обмена...");

    let wl_paste = super::wl_paste::WlPasteBackend::new();
    if wl_paste.test().is_ok() {
        info!("Используем wl-paste");
        return Arc::new(wl_paste);
    }

    let xclip = super::xclip::XclipBackend::new();
    if xclip.test().is_ok() {
        info!("Используем xclip");
        return Arc::new(xclip);
    }

    // Каждый опрос самодостаточен, поэтому отсутствие инструмента сейчас не
    // фатально: очередной тик попробует чтение заново
    warn!("Ни один инструмент буфера обмена не прошёл проверку, остаёмся на wl-paste");
    Arc::new(super::wl_paste::WlPasteBackend::new())
}
