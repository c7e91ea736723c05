use crate::error::{DndError, Result};
use std::process::Command;
use tracing::debug;

pub struct XclipBackend;

impl XclipBackend {
    pub fn new() -> Self {
        Self
    }

    fn run_xclip(args: &[&str]) -> Result<String> {
        let output = Command::new("xclip").args(args).output().map_err(|e| {
            debug!("xclip не найден или не работает: {}", e);
            DndError::Clipboard(format!("xclip не найден: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("xclip вернул ошибку: {}", stderr);
            return DndError::clipboard(format!("xclip вернул ошибку: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl super::r#trait::ClipboardBackend for XclipBackend {
    fn name(&self) -> &str {
        "xclip"
    }

    fn test(&self) -> Result<()> {
        Self::run_xclip(&["-selection", "clipboard", "-t", "TARGETS", "-o"]).map(|_| ())
    }

    fn formats(&self) -> Result<Vec<String>> {
        let output = Self::run_xclip(&["-selection", "clipboard", "-t", "TARGETS", "-o"])?;
        Ok(output
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn read_format(&self, format: &str) -> Result<String> {
        Self::run_xclip(&["-selection", "clipboard", "-t", format, "-o"])
    }

    fn read_text(&self) -> Result<String> {
        Self::run_xclip(&["-selection", "clipboard", "-o"])
    }

    fn read_markup(&self) -> Result<String> {
        Self::run_xclip(&["-selection", "clipboard", "-t", "text/html", "-o"])
    }
}
