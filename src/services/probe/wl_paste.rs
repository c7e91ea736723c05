use crate::error::{DndError, Result};
use std::process::Command;
use tracing::debug;

pub struct WlPasteBackend;

impl WlPasteBackend {
    pub fn new() -> Self {
        Self
    }

    fn run_wl_paste(args: &[&str]) -> Result<String> {
        let output = Command::new("wl-paste").args(args).output().map_err(|e| {
            debug!("wl-paste не найден или не работает: {}", e);
            DndError::Clipboard(format!("wl-paste не найден: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("wl-paste вернул ошибку: {}", stderr);
            return DndError::clipboard(format!("wl-paste вернул ошибку: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl super::r#trait::ClipboardBackend for WlPasteBackend {
    fn name(&self) -> &str {
        "wl-paste"
    }

    fn test(&self) -> Result<()> {
        Self::run_wl_paste(&["--list-types"]).map(|_| ())
    }

    fn formats(&self) -> Result<Vec<String>> {
        let output = Self::run_wl_paste(&["--list-types"])?;
        Ok(output
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn read_format(&self, format: &str) -> Result<String> {
        Self::run_wl_paste(&["--no-newline", "--type", format])
    }

    fn read_text(&self) -> Result<String> {
        Self::run_wl_paste(&["--no-newline", "--type", "text/plain"])
    }

    fn read_markup(&self) -> Result<String> {
        Self::run_wl_paste(&["--no-newline", "--type", "text/html"])
    }
}
