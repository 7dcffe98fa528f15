use tracing::{info, warn};

/// Проверить окружение сессии перед запуском.
/// Проверки рекомендательные: предупреждаем, но не падаем - окончательное
/// слово за подключением к шине и за фабрикой оконной системы.
pub fn check_environment(dry_run: bool) {
    info!("Проверка окружения сессии...");

    check_session_bus();

    if !dry_run {
        check_compositor();
    }

    info!("Проверка окружения завершена");
}

fn check_session_bus() {
    if std::env::var("DBUS_SESSION_BUS_ADDRESS").is_ok() {
        info!("Сессионная шина: DBUS_SESSION_BUS_ADDRESS установлена");
        return;
    }

    match std::env::var("XDG_RUNTIME_DIR") {
        Ok(dir) => {
            let bus_path = format!("{}/bus", dir);
            if std::path::Path::new(&bus_path).exists() {
                info!("Сессионная шина: {}", bus_path);
            } else {
                warn!("Сокет сессионной шины {} не найден", bus_path);
            }
        }
        Err(_) => {
            warn!("Ни DBUS_SESSION_BUS_ADDRESS, ни XDG_RUNTIME_DIR не установлены");
        }
    }
}

fn check_compositor() {
    if std::env::var("SWAYSOCK").is_ok() {
        info!("Обнаружен sway (SWAYSOCK)");
        return;
    }

    if std::env::var("HYPRLAND_INSTANCE_SIGNATURE").is_ok() {
        info!("Обнаружен Hyprland (HYPRLAND_INSTANCE_SIGNATURE)");
        return;
    }

    warn!("⚠️  Композитор не обнаружен!");
    warn!("   Поддерживаются sway и Hyprland");
    warn!("   Укажите бэкенд явно (window.backend в hints.toml)");
    warn!("   или запустите с --dry-run для проверки сервиса без композитора");
}

/// Получить рекомендуемые команды для диагностики окружения
#[allow(dead_code)]
pub fn get_diagnostic_commands() -> Vec<String> {
    vec![
        "# Проверить сессионную шину:".to_string(),
        "echo $DBUS_SESSION_BUS_ADDRESS".to_string(),
        "busctl --user list | grep realh".to_string(),
        "".to_string(),
        "# Проверить композитор:".to_string(),
        "echo $SWAYSOCK".to_string(),
        "echo $HYPRLAND_INSTANCE_SIGNATURE".to_string(),
        "".to_string(),
        "# Вызвать сервис вручную:".to_string(),
        "busctl --user call uk.co.realh.Hints /uk/co/realh/Hints uk.co.realh.Hints FocusedWindowInfo"
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_commands() {
        let commands = get_diagnostic_commands();
        assert!(!commands.is_empty());
        assert!(commands.iter().any(|cmd| cmd.contains("busctl")));
        assert!(commands.iter().any(|cmd| cmd.contains("FocusedWindowInfo")));
    }
}
