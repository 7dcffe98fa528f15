use serde::{Deserialize, Serialize};
use std::fmt;

/// Снимок сфокусированного окна на момент запроса
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub pid: i32,
    pub wm_class: String,
    pub monitor: i32,
}

impl WindowInfo {
    /// Сентинел "нет сфокусированного окна": pid = -1, wm_class = "", monitor = -1.
    /// Это не ошибка, а штатный ответ.
    pub fn no_focus() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            pid: -1,
            wm_class: String::new(),
            monitor: -1,
        }
    }

    pub fn is_no_focus(&self) -> bool {
        self.pid == -1 && self.wm_class.is_empty() && self.monitor == -1
    }

    /// Семь полей ответа FocusedWindowInfo в порядке сигнатуры D-Bus
    pub fn into_reply(self) -> (i32, i32, i32, i32, i32, String, i32) {
        (
            self.x,
            self.y,
            self.width,
            self.height,
            self.pid,
            self.wm_class,
            self.monitor,
        )
    }

    /// Только рамка окна (декорированные границы в экранных координатах)
    pub fn extents(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.width, self.height)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_focus() {
            write!(f, "<нет фокуса>")
        } else {
            write!(
                f,
                "\"{}\" pid={} {}x{}+{}+{} монитор={}",
                self.wm_class, self.pid, self.width, self.height, self.x, self.y, self.monitor
            )
        }
    }
}

/// Новое окно из потока событий оконной системы.
/// id — непрозрачный идентификатор бэкенда (con_id у sway, address у hyprland).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWindow {
    pub id: String,
    pub pid: i32,
    pub title: String,
}

impl CreatedWindow {
    pub fn new(id: impl Into<String>, pid: i32, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pid,
            title: title.into(),
        }
    }
}

impl fmt::Display for CreatedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" (pid={}, id={})", self.title, self.pid, self.id)
    }
}

/// Событие жизненного цикла окна
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEvent {
    pub window: CreatedWindow,
    pub timestamp: std::time::Instant,
    pub event_type: WindowEventType,
}

impl WindowEvent {
    pub fn new(window: CreatedWindow, event_type: WindowEventType) -> Self {
        Self {
            window,
            timestamp: std::time::Instant::now(),
            event_type,
        }
    }

    pub fn created(window: CreatedWindow) -> Self {
        Self::new(window, WindowEventType::Created)
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} ({}ms ago)",
            self.event_type,
            self.window,
            self.timestamp.elapsed().as_millis()
        )
    }
}

/// Тип события окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowEventType {
    Created,
    Destroyed,
    FocusChanged,
    TitleChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_focus_sentinel() {
        let info = WindowInfo::no_focus();
        assert!(info.is_no_focus());
        assert_eq!(info.into_reply(), (0, 0, 0, 0, -1, String::new(), -1));
    }

    #[test]
    fn test_reply_field_order() {
        let info = WindowInfo {
            x: 10,
            y: 20,
            width: 300,
            height: 200,
            pid: 4242,
            wm_class: "Editor".to_string(),
            monitor: 1,
        };
        assert!(!info.is_no_focus());
        assert_eq!(info.extents(), (10, 20, 300, 200));
        assert_eq!(
            info.into_reply(),
            (10, 20, 300, 200, 4242, "Editor".to_string(), 1)
        );
    }

    #[test]
    fn test_created_event() {
        let window = CreatedWindow::new("42", 1234, "Hints");
        let event = WindowEvent::created(window.clone());

        assert_eq!(event.window, window);
        assert_eq!(event.event_type, WindowEventType::Created);
    }
}
