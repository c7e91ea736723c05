use crate::error::{DndError, Result};
use std::fs;
use tracing::{info, warn};

/// Проверить права доступа к необходимым ресурсам
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    // Проверка доступа к /dev/input/
    check_input_devices_access()?;

    // Проверка, что не запущен от root (рекомендация безопасности)
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let input_dir = "/dev/input";

    if !std::path::Path::new(input_dir).exists() {
        return Err(DndError::Permission(format!(
            "Директория {} не существует",
            input_dir
        )));
    }

    // Проверяем возможность чтения директории
    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(DndError::Permission(format!(
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir, e
        ))),
    }
}

fn check_not_root() {
    // Проверяем переменную окружения USER
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Рекомендуется добавить пользователя в группу 'input'");
            warn!("   и запускать приложение от имени обычного пользователя");
            warn!("   Команда:");
            warn!("   sudo usermod -a -G input $USER");
            warn!("   (затем перезайдите в систему)");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
#[allow(dead_code)]
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в группу input:".to_string(),
        "sudo usermod -a -G input $USER".to_string(),
        "".to_string(),
        "# После выполнения команды перезайдите в систему".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands() {
        let commands = get_setup_commands();
        assert!(!commands.is_empty());
        assert!(commands.iter().any(|cmd| cmd.contains("usermod")));
    }
}
