use crate::debug_if_enabled;
use crate::error::{HintsError, Result};
use crate::events::{CreatedWindow, WindowEvent, WindowEventType, WindowInfo};
use crate::hints_error;
use crate::services::placement::PlacementRegistry;
use crate::services::window_system::WindowSystem;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::Command;
use tracing::{debug, info};

pub struct HyprlandWindowSystem;

/// Распакованная строка событийного сокета (.socket2.sock)
#[derive(Debug, PartialEq, Eq)]
enum HyprEvent {
    Open {
        address: String,
        title: String,
    },
    Close {
        address: String,
    },
}

impl HyprlandWindowSystem {
    pub fn new() -> Self {
        Self
    }

    async fn hyprctl(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("hyprctl")
            .args(args)
            .output()
            .await
            .map_err(|e| HintsError::WindowSystem(format!("hyprctl не найден: {}", e)))?;

        if !output.status.success() {
            return Err(hints_error!(
                window_system,
                "hyprctl {:?} вернул ошибку: {}",
                args,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// pid нового окна не приходит в событии - добираем его из clients -j
    async fn resolve_pid(&self, address: &str) -> i32 {
        let raw = match self.hyprctl(&["clients", "-j"]).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Не удалось получить список клиентов: {}", e);
                return -1;
            }
        };

        let clients: Value = match serde_json::from_str(&raw) {
            Ok(clients) => clients,
            Err(e) => {
                debug!("Не удалось разобрать список клиентов: {}", e);
                return -1;
            }
        };

        clients
            .as_array()
            .and_then(|arr| arr.iter().find(|c| c["address"].as_str() == Some(address)))
            .and_then(|c| c["pid"].as_i64())
            .map(|pid| pid as i32)
            .unwrap_or(-1)
    }

    async fn event_from_line(&self, line: &str) -> Option<WindowEvent> {
        match parse_event_line(line)? {
            HyprEvent::Open { address, title } => {
                let pid = self.resolve_pid(&address).await;
                Some(WindowEvent::created(CreatedWindow::new(address, pid, title)))
            }
            HyprEvent::Close { address } => Some(WindowEvent::new(
                CreatedWindow::new(address, -1, ""),
                WindowEventType::Destroyed,
            )),
        }
    }
}

/// Снимок окна из вывода `hyprctl activewindow -j`.
/// Отсутствующий address означает, что фокуса нет.
fn window_info_from_active(value: &Value) -> Option<WindowInfo> {
    value["address"].as_str()?;

    let coord = |field: &str, idx: usize| -> i32 {
        value[field]
            .as_array()
            .and_then(|a| a.get(idx))
            .and_then(|v| v.as_i64())
            .unwrap_or(0) as i32
    };

    Some(WindowInfo {
        x: coord("at", 0),
        y: coord("at", 1),
        width: coord("size", 0),
        height: coord("size", 1),
        pid: value["pid"].as_i64().unwrap_or(-1) as i32,
        wm_class: value["class"].as_str().unwrap_or("").to_string(),
        monitor: value["monitor"].as_i64().unwrap_or(-1) as i32,
    })
}

/// Строка сокета событий: `openwindow>>address,workspace,class,title`.
/// Адреса в событиях приходят без префикса 0x, а clients/dispatch ждут его.
fn parse_event_line(line: &str) -> Option<HyprEvent> {
    let (event, payload) = line.split_once(">>")?;

    match event {
        "openwindow" => {
            let mut parts = payload.splitn(4, ',');
            let address = parts.next()?;
            let _workspace = parts.next()?;
            let _class = parts.next()?;
            // Заголовок может содержать запятые - он всегда последний
            let title = parts.next().unwrap_or("");
            Some(HyprEvent::Open {
                address: format!("0x{}", address),
                title: title.to_string(),
            })
        }
        "closewindow" => Some(HyprEvent::Close {
            address: format!("0x{}", payload),
        }),
        _ => None,
    }
}

#[async_trait::async_trait]
impl WindowSystem for HyprlandWindowSystem {
    fn name(&self) -> &'static str {
        "hyprland"
    }

    async fn focused_window(&self) -> Result<Option<WindowInfo>> {
        let raw = self.hyprctl(&["activewindow", "-j"]).await?;

        // При отсутствии фокуса hyprctl печатает пустой объект или "Invalid"
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(_) => {
                debug!("activewindow вернул не-JSON ответ: {}", raw.trim());
                return Ok(None);
            }
        };

        Ok(window_info_from_active(&value))
    }

    async fn move_window(&self, window: &CreatedWindow, x: i32, y: i32) -> Result<()> {
        let dispatch = format!("exact {} {},address:{}", x, y, window.id);
        self.hyprctl(&["dispatch", "movewindowpixel", dispatch.as_str()])
            .await?;
        Ok(())
    }

    async fn assign_monitor(&self, window: &CreatedWindow, monitor: i32) -> Result<()> {
        let raw = self.hyprctl(&["monitors", "-j"]).await?;
        let monitors: Value = serde_json::from_str(&raw)?;

        // Окно попадает на монитор через его активный workspace
        let workspace = monitors
            .as_array()
            .and_then(|arr| {
                arr.iter()
                    .find(|m| m["id"].as_i64() == Some(monitor as i64))
            })
            .and_then(|m| m["activeWorkspace"]["id"].as_i64())
            .ok_or_else(|| hints_error!(window_system, "Монитор с индексом {} не найден", monitor))?;

        let dispatch = format!("{},address:{}", workspace, window.id);
        self.hyprctl(&["dispatch", "movetoworkspacesilent", dispatch.as_str()])
            .await?;
        Ok(())
    }

    async fn watch(&self, registry: Arc<PlacementRegistry>) -> Result<()> {
        let signature = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").map_err(|_| {
            hints_error!(
                service_unavailable,
                "HYPRLAND_INSTANCE_SIGNATURE не установлена"
            )
        })?;
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
            .map_err(|_| hints_error!(service_unavailable, "XDG_RUNTIME_DIR не установлена"))?;

        let socket_path = format!("{}/hypr/{}/.socket2.sock", runtime_dir, signature);
        let stream = UnixStream::connect(&socket_path).await.map_err(|e| {
            HintsError::WindowSystem(format!(
                "Не удалось подключиться к сокету событий {}: {}",
                socket_path, e
            ))
        })?;

        info!("Подписка на события окон Hyprland активна: {}", socket_path);

        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            let Some(event) = self.event_from_line(&line).await else {
                continue;
            };

            debug_if_enabled!("Событие Hyprland: {}", event);
            registry.handle_window_event(self, &event).await;
        }

        Err(hints_error!(
            service_unavailable,
            "Поток событий Hyprland завершился"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openwindow_line() {
        let event = parse_event_line("openwindow>>45f7c2a0,3,kitty,zsh - ~/src").unwrap();
        assert_eq!(
            event,
            HyprEvent::Open {
                address: "0x45f7c2a0".to_string(),
                title: "zsh - ~/src".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_openwindow_title_with_commas() {
        let event = parse_event_line("openwindow>>45f7c2a0,3,kitty,a, b, c").unwrap();
        assert_eq!(
            event,
            HyprEvent::Open {
                address: "0x45f7c2a0".to_string(),
                title: "a, b, c".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_closewindow_line() {
        let event = parse_event_line("closewindow>>45f7c2a0").unwrap();
        assert_eq!(
            event,
            HyprEvent::Close {
                address: "0x45f7c2a0".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_ignores_unknown_events() {
        assert!(parse_event_line("workspace>>2").is_none());
        assert!(parse_event_line("мусор без разделителя").is_none());
    }

    #[test]
    fn test_window_info_from_activewindow() {
        let value: Value = serde_json::from_str(
            r#"{
                "address": "0x45f7c2a0",
                "at": [10, 20],
                "size": [300, 200],
                "pid": 4242,
                "class": "Editor",
                "monitor": 1
            }"#,
        )
        .unwrap();

        let info = window_info_from_active(&value).unwrap();
        assert_eq!(
            info.into_reply(),
            (10, 20, 300, 200, 4242, "Editor".to_string(), 1)
        );
    }

    #[test]
    fn test_no_focus_is_none() {
        let value: Value = serde_json::from_str("{}").unwrap();
        assert!(window_info_from_active(&value).is_none());
    }
}
