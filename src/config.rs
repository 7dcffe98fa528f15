use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub bus: BusConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    pub service_name: String,
    pub object_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub backend: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "hints_bridge=info".to_string(),
            },
            bus: BusConfig {
                service_name: "uk.co.realh.Hints".to_string(),
                object_path: "/uk/co/realh/Hints".to_string(),
            },
            window: WindowConfig {
                backend: "auto".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл конфигурации не ошибка - работаем на значениях по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("HINTS_"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
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

        // Валидация настроек шины
        if !self.bus.service_name.contains('.') {
            anyhow::bail!(
                "Неверное имя сервиса на шине: {}",
                self.bus.service_name
            );
        }

        if !self.bus.object_path.starts_with('/') || self.bus.object_path.ends_with('/') {
            anyhow::bail!("Неверный путь объекта: {}", self.bus.object_path);
        }

        // Валидация бэкенда оконной системы
        match self.window.backend.as_str() {
            "auto" | "sway" | "hyprland" => {}
            _ => anyhow::bail!(
                "Неверный бэкенд оконной системы: {}",
                self.window.backend
            ),
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
        assert_eq!(config.bus.service_name, "uk.co.realh.Hints");
        assert_eq!(config.bus.object_path, "/uk/co/realh/Hints");
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let mut config = Config::default();
        config.window.backend = "kwin".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_object_path_rejected() {
        let mut config = Config::default();
        config.bus.object_path = "uk/co/realh/Hints".to_string();
        assert!(config.validate().is_err());

        config.bus.object_path = "/uk/co/realh/Hints/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/hints.toml").unwrap();
        assert_eq!(config.window.backend, "auto");
    }
}
