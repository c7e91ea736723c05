use thiserror::Error;

#[derive(Error, Debug)]
pub enum DndError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Ошибка чтения буфера обмена: {0}")]
    Clipboard(String),

    #[error("Компонент уже запущен: {0}")]
    AlreadyActive(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl DndError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(DndError::DeviceNotFound(msg.into()))
    }

    pub fn clipboard<T>(msg: impl Into<String>) -> Result<T> {
        Err(DndError::Clipboard(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, DndError>;
