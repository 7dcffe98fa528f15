use thiserror::Error;

#[derive(Error, Debug)]
pub enum HintsError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка разбора JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка оконной системы: {0}")]
    WindowSystem(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, HintsError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! hints_error {
    (window_system, $($arg:tt)*) => {
        $crate::error::HintsError::WindowSystem(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::HintsError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::HintsError::Internal(format!($($arg)*))
    };
}
