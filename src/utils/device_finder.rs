use crate::error::{DndError, Result};
use evdev::{KeyCode, RelativeAxisCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти подходящее устройство указателя
    pub fn find_pointer_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                DndError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ))
            };
        }

        // Автопоиск устройства указателя
        Self::auto_find_pointer()
    }

    fn auto_find_pointer() -> Result<PathBuf> {
        info!("Начинаем автопоиск устройства указателя...");

        // Попробуем найти устройство по ID
        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        // Попробуем найти устройство в /dev/input/event*
        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        DndError::device_not_found(
            "Не удалось найти подходящее устройство указателя. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return DndError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir).map_err(|e| {
            DndError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e))
        })?;

        let mut potential_pointers = Vec::new();

        for entry in entries {
            let entry = entry.map_err(DndError::Io)?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            // Сначала ищем все устройства с mouse в названии
            if (name.contains("mouse") || name.contains("Mouse")) && name.contains("event") {
                debug!("Найдено потенциальное устройство указателя: {:?}", path);

                if Self::is_device_accessible(&path) {
                    potential_pointers.push((path.clone(), name.to_string()));
                } else {
                    warn!("Устройство {:?} недоступно", path);
                }
            }
        }

        // Теперь фильтруем и приоритизируем
        let mut filtered_pointers = Vec::new();

        for (path, name) in potential_pointers {
            // Исключаем клавиатуры, попавшие в выборку по составному имени
            if name.contains("kbd") || name.contains("keyboard") {
                debug!("Исключаем как клавиатуру: {} -> {}", name, path.display());
                continue;
            }

            // Проверяем, что это действительно указатель через evdev
            if Self::is_pointer_device(&path)? {
                let priority = if name.ends_with("event-mouse") {
                    100 // Высший приоритет для -event-mouse устройств
                } else {
                    10 // Обычный приоритет
                };

                filtered_pointers.push((path, priority));
                info!("Добавлено устройство указателя: {} (приоритет: {})", name, priority);
            } else {
                debug!("Устройство не прошло проверку как указатель: {}", name);
            }
        }

        // Сортируем по приоритету и возвращаем лучшее
        filtered_pointers.sort_by(|a, b| b.1.cmp(&a.1));

        if let Some((pointer, _)) = filtered_pointers.into_iter().next() {
            Ok(pointer)
        } else {
            DndError::device_not_found("Устройство указателя не найдено в by-id")
        }
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let input_dir = Path::new("/dev/input");

        let entries = fs::read_dir(input_dir)
            .map_err(|e| DndError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();

        for entry in entries {
            let entry = entry.map_err(DndError::Io)?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            if name.starts_with("event") {
                event_devices.push(path);
            }
        }

        // Сортируем устройства по номеру
        event_devices.sort();

        // Проверяем каждое устройство на предмет того, является ли оно указателем
        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);

            if Self::is_pointer_device(&device_path)? && Self::is_device_accessible(&device_path)
            {
                return Ok(device_path);
            }
        }

        DndError::device_not_found(
            "Не найдено доступное устройство указателя среди event устройств",
        )
    }

    fn is_pointer_device(device_path: &Path) -> Result<bool> {
        // Используем evdev для проверки возможностей устройства
        match evdev::Device::open(device_path) {
            Ok(device) => {
                let device_name = device.name().unwrap_or("Unknown").to_lowercase();

                // Исключаем клавиатуры по имени устройства
                if device_name.contains("keyboard") || device_name.contains("kbd") {
                    debug!(
                        "Исключаем устройство как клавиатуру: {:?} ({})",
                        device_path, device_name
                    );
                    return Ok(false);
                }

                // Указатель сообщает относительные оси и левую кнопку
                let has_relative_axes = device.supported_relative_axes().map_or(false, |axes| {
                    axes.contains(RelativeAxisCode::REL_X)
                        && axes.contains(RelativeAxisCode::REL_Y)
                });

                let has_left_button = device
                    .supported_keys()
                    .map_or(false, |keys| keys.contains(KeyCode::BTN_LEFT));

                let is_pointer = has_relative_axes && has_left_button;

                if is_pointer {
                    info!("Устройство {:?} подходит как указатель", device_path);
                    debug!("Имя устройства: {:?}", device.name());
                } else {
                    debug!(
                        "Устройство {:?} не подходит как указатель (имя: {})",
                        device_path, device_name
                    );
                }

                Ok(is_pointer)
            }
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                Ok(false)
            }
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}
