use serde::{Deserialize, Serialize};
use std::fmt;

/// Фаза сессии определения перетаскивания
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragPhase {
    Idle,
    OptimisticallyActive,
}

/// События, которые детектор перетаскивания отдаёт подписчикам
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    /// Оптимистичный старт сессии перетаскивания
    Start,
    /// Завершение сессии по тайм-ауту
    End,
    /// В буфере обмена замечены файловые ссылки
    FilesDetected(Vec<String>),
}

impl fmt::Display for DragEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragEvent::Start => write!(f, "drag-start"),
            DragEvent::End => write!(f, "drag-end"),
            DragEvent::FilesDetected(paths) => {
                write!(f, "files-detected ({} шт.)", paths.len())
            }
        }
    }
}
