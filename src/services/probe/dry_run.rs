use crate::error::{DndError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Эмуляция буфера обмена для dry-run режима и тестов.
///
/// Содержимое задаётся вручную; пустое состояние даёт отрицательный ответ на
/// любой запрос, как системный буфер без данных.
pub struct DryRunBackend {
    state: RwLock<DryRunState>,
}

#[derive(Default)]
struct DryRunState {
    formats: Vec<String>,
    contents: HashMap<String, String>,
    text: Option<String>,
    markup: Option<String>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DryRunState::default()),
        }
    }

    #[allow(dead_code)]
    pub fn set_formats<I, S>(&self, formats: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.write().formats = formats.into_iter().map(Into::into).collect();
    }

    #[allow(dead_code)]
    pub fn set_content(&self, format: impl Into<String>, content: impl Into<String>) {
        self.state
            .write()
            .contents
            .insert(format.into(), content.into());
    }

    #[allow(dead_code)]
    pub fn set_text(&self, text: impl Into<String>) {
        self.state.write().text = Some(text.into());
    }

    #[allow(dead_code)]
    pub fn set_markup(&self, markup: impl Into<String>) {
        self.state.write().markup = Some(markup.into());
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        *self.state.write() = DryRunState::default();
    }
}

impl super::r#trait::ClipboardBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn test(&self) -> Result<()> {
        Ok(())
    }

    fn formats(&self) -> Result<Vec<String>> {
        Ok(self.state.read().formats.clone())
    }

    fn read_format(&self, format: &str) -> Result<String> {
        self.state
            .read()
            .contents
            .get(format)
            .cloned()
            .ok_or_else(|| DndError::Clipboard(format!("нет содержимого для формата {}", format)))
    }

    fn read_text(&self) -> Result<String> {
        self.state
            .read()
            .text
            .clone()
            .ok_or_else(|| DndError::Clipboard("нет текстового содержимого".to_string()))
    }

    fn read_markup(&self) -> Result<String> {
        self.state
            .read()
            .markup
            .clone()
            .ok_or_else(|| DndError::Clipboard("нет разметки".to_string()))
    }
}
