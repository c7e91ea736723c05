use crate::config::Config;
use crate::debug_if_enabled;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

use super::r#trait::ClipboardBackend;

const FILE_SCHEME: &str = "file://";

/// Известные файловые сигнатуры буферов обмена разных платформ (в нижнем
/// регистре). Подстрочное совпадение с "file" дополняет список как
/// сознательно широкая сетка.
static FILE_FORMAT_SIGNATURES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();

    // macOS pasteboard
    set.insert("public.file-url");
    set.insert("nsfilenamespboardtype");

    // Windows clipboard
    set.insert("cf_hdrop");
    set.insert("filenamew");
    set.insert("filename");

    // Linux / freedesktop
    set.insert("text/uri-list");
    set.insert("x-special/gnome-copied-files");
    set.insert("application/vnd.portal.filetransfer");

    set
});

/// Форматы, из которых файловые ссылки читаются напрямую
const URL_FORMATS: [&str; 3] = [
    "public.file-url",
    "text/uri-list",
    "x-special/gnome-copied-files",
];

/// Результат одного опроса буфера обмена
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardProbeResult {
    pub has_file_signature: bool,
    pub file_paths: Vec<String>,
}

impl ClipboardProbeResult {
    #[allow(dead_code)]
    pub fn negative() -> Self {
        Self {
            has_file_signature: false,
            file_paths: Vec::new(),
        }
    }
}

/// Одноразовая эвристическая проверка буфера обмена на признаки внешнего
/// перетаскивания файлов.
///
/// Каждый вызов `probe()` - самостоятельный снимок: сбои чтения гасятся и
/// превращаются в отрицательный результат, между двумя вызовами
/// согласованность содержимого не предполагается.
pub struct ClipboardFileProbe {
    backend: Arc<dyn ClipboardBackend>,
    extra_formats: HashSet<String>,
}

impl ClipboardFileProbe {
    pub fn new(backend: Arc<dyn ClipboardBackend>, config: &Config) -> Self {
        Self {
            backend,
            extra_formats: config.extra_formats_lower().clone(),
        }
    }

    /// Снять снимок буфера обмена; никогда не возвращает ошибку
    pub fn probe(&self) -> ClipboardProbeResult {
        let mut has_signature = false;
        let mut paths: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // Шаг 1: сигнатуры среди идентификаторов форматов
        let formats = match self.backend.formats() {
            Ok(formats) => formats,
            Err(e) => {
                debug_if_enabled!("Перечисление форматов не удалось: {}", e);
                Vec::new()
            }
        };

        if formats.iter().any(|format| self.is_file_format(format)) {
            has_signature = true;
        }

        // Шаг 2: прямые файловые URL форматы
        for url_format in URL_FORMATS {
            if !formats
                .iter()
                .any(|format| format.eq_ignore_ascii_case(url_format))
            {
                continue;
            }

            match self.backend.read_format(url_format) {
                Ok(content) => Self::collect_file_urls(&content, &mut paths, &mut seen),
                Err(e) => {
                    debug_if_enabled!("Чтение формата {} не удалось: {}", url_format, e);
                }
            }
        }

        // Шаг 3: обычный текст, начинающийся с файловой схемы
        match self.backend.read_text() {
            Ok(text) => {
                let trimmed = text.trim_start();
                if trimmed.starts_with(FILE_SCHEME) {
                    has_signature = true;
                    Self::collect_file_urls(trimmed, &mut paths, &mut seen);
                }
            }
            Err(e) => {
                debug_if_enabled!("Чтение текста не удалось: {}", e);
            }
        }

        // Шаг 4: разметка с файловой ссылкой, путь не извлекается
        if !has_signature {
            match self.backend.read_markup() {
                Ok(markup) => {
                    if markup.contains(FILE_SCHEME) {
                        has_signature = true;
                    }
                }
                Err(e) => {
                    debug_if_enabled!("Чтение разметки не удалось: {}", e);
                }
            }
        }

        // Непустой список путей сам по себе означает сигнатуру
        if !paths.is_empty() {
            has_signature = true;
        }

        ClipboardProbeResult {
            has_file_signature: has_signature,
            file_paths: paths,
        }
    }

    fn is_file_format(&self, format: &str) -> bool {
        let lower = format.to_lowercase();

        FILE_FORMAT_SIGNATURES.contains(lower.as_str())
            || self.extra_formats.contains(&lower)
            || lower.contains("file")
    }

    /// Собрать файловые ссылки построчно: дубликаты отбрасываются, порядок
    /// обнаружения сохраняется
    fn collect_file_urls(content: &str, paths: &mut Vec<String>, seen: &mut HashSet<String>) {
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with(FILE_SCHEME) && seen.insert(line.to_string()) {
                paths.push(line.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::dry_run::DryRunBackend;
    use super::*;
    use crate::error::{DndError, Result};

    struct FailingBackend;

    impl ClipboardBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn test(&self) -> Result<()> {
            DndError::clipboard("недоступен")
        }

        fn formats(&self) -> Result<Vec<String>> {
            DndError::clipboard("недоступен")
        }

        fn read_format(&self, _format: &str) -> Result<String> {
            DndError::clipboard("недоступен")
        }

        fn read_text(&self) -> Result<String> {
            DndError::clipboard("недоступен")
        }

        fn read_markup(&self) -> Result<String> {
            DndError::clipboard("недоступен")
        }
    }

    fn probe_with(backend: DryRunBackend) -> ClipboardFileProbe {
        ClipboardFileProbe::new(Arc::new(backend), &Config::default())
    }

    #[test]
    fn test_file_url_format_yields_path() {
        let backend = DryRunBackend::new();
        backend.set_formats(["public.file-url"]);
        backend.set_content("public.file-url", "file:///a.txt");

        let result = probe_with(backend).probe();

        assert!(result.has_file_signature);
        assert_eq!(result.file_paths, vec!["file:///a.txt".to_string()]);
    }

    #[test]
    fn test_plain_text_clipboard_is_negative() {
        let backend = DryRunBackend::new();
        backend.set_formats(["text/plain"]);
        backend.set_text("hello");

        let result = probe_with(backend).probe();

        assert!(!result.has_file_signature);
        assert!(result.file_paths.is_empty());
    }

    #[test]
    fn test_substring_catch_all_matches_unknown_format() {
        let backend = DryRunBackend::new();
        backend.set_formats(["com.example.MyFileThing"]);

        let result = probe_with(backend).probe();

        // Сознательно широкая сетка: достаточно подстроки "file"
        assert!(result.has_file_signature);
        assert!(result.file_paths.is_empty());
    }

    #[test]
    fn test_text_with_file_scheme_yields_path() {
        let backend = DryRunBackend::new();
        backend.set_formats(["text/plain"]);
        backend.set_text("file:///home/user/doc.pdf");

        let result = probe_with(backend).probe();

        assert!(result.has_file_signature);
        assert_eq!(
            result.file_paths,
            vec!["file:///home/user/doc.pdf".to_string()]
        );
    }

    #[test]
    fn test_gnome_copied_files_marker_line_skipped() {
        let backend = DryRunBackend::new();
        backend.set_formats(["x-special/gnome-copied-files"]);
        backend.set_content(
            "x-special/gnome-copied-files",
            "copy\nfile:///a.txt\nfile:///b.txt",
        );

        let result = probe_with(backend).probe();

        assert!(result.has_file_signature);
        assert_eq!(
            result.file_paths,
            vec!["file:///a.txt".to_string(), "file:///b.txt".to_string()]
        );
    }

    #[test]
    fn test_paths_deduplicated_in_discovery_order() {
        let backend = DryRunBackend::new();
        backend.set_formats(["text/uri-list"]);
        backend.set_content(
            "text/uri-list",
            "file:///b.txt\nfile:///a.txt\nfile:///b.txt",
        );
        backend.set_text("file:///a.txt");

        let result = probe_with(backend).probe();

        assert_eq!(
            result.file_paths,
            vec!["file:///b.txt".to_string(), "file:///a.txt".to_string()]
        );
    }

    #[test]
    fn test_markup_reference_sets_signature_without_paths() {
        let backend = DryRunBackend::new();
        backend.set_formats(["text/html"]);
        backend.set_markup("<a href=\"file:///tmp/x\">x</a>");

        let result = probe_with(backend).probe();

        assert!(result.has_file_signature);
        assert!(result.file_paths.is_empty());
    }

    #[test]
    fn test_backend_failure_is_silent_negative() {
        let probe = ClipboardFileProbe::new(Arc::new(FailingBackend), &Config::default());

        let result = probe.probe();

        assert_eq!(result, ClipboardProbeResult::negative());
    }

    #[test]
    fn test_extra_formats_from_config() {
        let mut config = Config::default();
        config.probe.extra_file_formats = vec!["application/x-my-drop".to_string()];
        config.build_optimization_indexes();

        let backend = DryRunBackend::new();
        backend.set_formats(["application/x-my-drop"]);

        let probe = ClipboardFileProbe::new(Arc::new(backend), &config);
        assert!(probe.probe().has_file_signature);
    }
}
