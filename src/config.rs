use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub shake: ShakeConfig,
    // Оптимизационный индекс - не сериализуется, строится после загрузки
    #[serde(skip)]
    extra_formats_lower: HashSet<String>, // Предварительно нормализованные форматы
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Путь к устройству указателя или "auto" для автопоиска
    pub device_path: String,
    /// Интервал тика учёта производительности
    pub accounting_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Инструмент чтения буфера обмена: "auto", "wl-paste" или "xclip"
    pub backend: String,
    /// Интервал опроса буфера обмена в активной сессии
    pub poll_interval_ms: u64,
    /// Дополнительные файловые форматы буфера обмена
    #[serde(default)]
    pub extra_file_formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Стратегия детекции: "optimistic" или "continuous"
    pub strategy: String,
    /// Тайм-аут автоматической деактивации оптимистичной сессии
    pub deactivation_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShakeConfig {
    pub enabled: bool,
    /// Минимальное число смен направления для срабатывания
    pub min_reversals: u32,
    /// Минимальный пробег указателя в одном направлении, px
    pub min_travel_px: f64,
    /// Окно, внутри которого считаются смены направления
    pub window_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: "dnd_rust=info".to_string(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
            accounting_interval_ms: 1000,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            poll_interval_ms: 100,
            extra_file_formats: Vec::new(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            strategy: "optimistic".to_string(),
            deactivation_timeout_ms: 3000,
        }
    }
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_reversals: 3,
            min_travel_px: 40.0,
            window_ms: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig::default(),
            tracker: TrackerConfig::default(),
            probe: ProbeConfig::default(),
            detector: DetectorConfig::default(),
            shake: ShakeConfig::default(),
            extra_formats_lower: HashSet::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DND_"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Строит оптимизационный индекс для быстрой проверки форматов
    pub fn build_optimization_indexes(&mut self) {
        self.extra_formats_lower = self
            .probe
            .extra_file_formats
            .iter()
            .map(|format| format.to_lowercase())
            .collect();
    }

    /// Дополнительные файловые форматы в нижнем регистре
    pub fn extra_formats_lower(&self) -> &HashSet<String> {
        &self.extra_formats_lower
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек трекера
        if self.tracker.accounting_interval_ms < 100 {
            anyhow::bail!("accounting_interval_ms должно быть минимум 100");
        }

        // Валидация настроек опроса буфера обмена
        match self.probe.backend.as_str() {
            "auto" | "wl-paste" | "xclip" => {}
            _ => anyhow::bail!("Неверный инструмент буфера обмена: {}", self.probe.backend),
        }

        if self.probe.poll_interval_ms < 10 {
            anyhow::bail!("poll_interval_ms должно быть минимум 10");
        }

        // Валидация настроек детектора
        match self.detector.strategy.as_str() {
            "optimistic" | "continuous" => {}
            _ => anyhow::bail!(
                "Неизвестная стратегия детекции: {}",
                self.detector.strategy
            ),
        }

        if self.detector.deactivation_timeout_ms < self.probe.poll_interval_ms {
            anyhow::bail!(
                "deactivation_timeout_ms ({}) не может быть меньше poll_interval_ms ({})",
                self.detector.deactivation_timeout_ms,
                self.probe.poll_interval_ms
            );
        }

        // Валидация настроек жеста встряхивания
        if self.shake.min_reversals == 0 {
            anyhow::bail!("min_reversals должно быть больше 0");
        }

        if self.shake.min_travel_px <= 0.0 || !self.shake.min_travel_px.is_finite() {
            anyhow::bail!("min_travel_px должно быть положительным числом");
        }

        if self.shake.window_ms == 0 {
            anyhow::bail!("window_ms должно быть больше 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_intervals_match_detection_contract() {
        let config = Config::default();

        assert_eq!(config.tracker.accounting_interval_ms, 1000);
        assert_eq!(config.probe.poll_interval_ms, 100);
        assert_eq!(config.detector.deactivation_timeout_ms, 3000);
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let mut config = Config::default();
        config.detector.strategy = "pessimistic".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let mut config = Config::default();
        config.probe.backend = "xsel".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_shorter_than_poll_rejected() {
        let mut config = Config::default();
        config.detector.deactivation_timeout_ms = 50;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extra_formats_are_normalized() {
        let mut config = Config::default();
        config.probe.extra_file_formats = vec!["Application/X-KDE-CutSelection".to_string()];

        // Перестраиваем оптимизационный индекс после изменения конфигурации
        config.build_optimization_indexes();

        assert!(config
            .extra_formats_lower()
            .contains("application/x-kde-cutselection"));
    }
}
