use crate::debug_if_enabled;
use crate::error::{HintsError, Result};
use crate::events::{CreatedWindow, WindowEvent, WindowEventType, WindowInfo};
use crate::hints_error;
use crate::services::placement::PlacementRegistry;
use crate::services::window_system::WindowSystem;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

pub struct SwayWindowSystem;

impl SwayWindowSystem {
    pub fn new() -> Self {
        Self
    }

    async fn swaymsg(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("swaymsg")
            .args(args)
            .output()
            .await
            .map_err(|e| HintsError::WindowSystem(format!("swaymsg не найден: {}", e)))?;

        if !output.status.success() {
            return Err(hints_error!(
                window_system,
                "swaymsg {:?} вернул ошибку: {}",
                args,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Найти сфокусированный контейнер в дереве get_tree, запоминая имя output,
/// внутри которого он лежит
fn find_focused<'a>(
    node: &'a Value,
    current_output: Option<&'a str>,
) -> Option<(&'a Value, Option<&'a str>)> {
    let output = if node["type"].as_str() == Some("output") {
        node["name"].as_str()
    } else {
        current_output
    };

    let node_type = node["type"].as_str();
    if node["focused"].as_bool() == Some(true)
        && matches!(node_type, Some("con") | Some("floating_con"))
    {
        return Some((node, output));
    }

    for key in ["nodes", "floating_nodes"] {
        if let Some(children) = node[key].as_array() {
            for child in children {
                if let Some(found) = find_focused(child, output) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Снимок окна из узла дерева. rect - декорированные границы контейнера.
/// Недоступные поля заменяются сентинелами, а не ошибкой.
fn window_info_from_node(node: &Value, monitor: i32) -> WindowInfo {
    let rect = &node["rect"];
    WindowInfo {
        x: rect["x"].as_i64().unwrap_or(0) as i32,
        y: rect["y"].as_i64().unwrap_or(0) as i32,
        width: rect["width"].as_i64().unwrap_or(0) as i32,
        height: rect["height"].as_i64().unwrap_or(0) as i32,
        pid: node["pid"].as_i64().unwrap_or(-1) as i32,
        // app_id для wayland-клиентов, class для Xwayland
        wm_class: node["app_id"]
            .as_str()
            .or_else(|| node["window_properties"]["class"].as_str())
            .unwrap_or("")
            .to_string(),
        monitor,
    }
}

/// Индекс output в массиве get_outputs (нумерация мониторов)
fn output_index(outputs: &Value, name: Option<&str>) -> i32 {
    let Some(name) = name else { return -1 };
    outputs
        .as_array()
        .and_then(|arr| arr.iter().position(|o| o["name"].as_str() == Some(name)))
        .map(|i| i as i32)
        .unwrap_or(-1)
}

/// Строка потока `swaymsg -t subscribe -m '["window"]'` -> событие окна.
/// Незнакомые change-значения пропускаются.
fn parse_window_event(line: &str) -> Result<Option<WindowEvent>> {
    let value: Value = serde_json::from_str(line)?;

    let event_type = match value["change"].as_str() {
        Some("new") => WindowEventType::Created,
        Some("close") => WindowEventType::Destroyed,
        Some("focus") => WindowEventType::FocusChanged,
        Some("title") => WindowEventType::TitleChanged,
        _ => return Ok(None),
    };

    let container = &value["container"];
    let Some(id) = container["id"].as_i64() else {
        return Ok(None);
    };

    let window = CreatedWindow::new(
        id.to_string(),
        container["pid"].as_i64().unwrap_or(-1) as i32,
        container["name"].as_str().unwrap_or(""),
    );

    Ok(Some(WindowEvent::new(window, event_type)))
}

#[async_trait::async_trait]
impl WindowSystem for SwayWindowSystem {
    fn name(&self) -> &'static str {
        "sway"
    }

    async fn focused_window(&self) -> Result<Option<WindowInfo>> {
        let raw = self.swaymsg(&["-t", "get_tree"]).await?;
        let tree: Value = serde_json::from_str(&raw)?;

        let Some((node, output)) = find_focused(&tree, None) else {
            return Ok(None);
        };

        let monitor = match self.swaymsg(&["-t", "get_outputs"]).await {
            Ok(raw_outputs) => serde_json::from_str::<Value>(&raw_outputs)
                .map(|outputs| output_index(&outputs, output))
                .unwrap_or(-1),
            Err(e) => {
                debug!("Не удалось получить список мониторов: {}", e);
                -1
            }
        };

        Ok(Some(window_info_from_node(node, monitor)))
    }

    async fn move_window(&self, window: &CreatedWindow, x: i32, y: i32) -> Result<()> {
        let command = format!("[con_id={}] move absolute position {} {}", window.id, x, y);
        self.swaymsg(&[command.as_str()]).await?;
        Ok(())
    }

    async fn assign_monitor(&self, window: &CreatedWindow, monitor: i32) -> Result<()> {
        let raw = self.swaymsg(&["-t", "get_outputs"]).await?;
        let outputs: Value = serde_json::from_str(&raw)?;

        let name = usize::try_from(monitor)
            .ok()
            .and_then(|idx| outputs.as_array().and_then(|arr| arr.get(idx)))
            .and_then(|o| o["name"].as_str())
            .ok_or_else(|| hints_error!(window_system, "Монитор с индексом {} не найден", monitor))?;

        let command = format!("[con_id={}] move container to output {}", window.id, name);
        self.swaymsg(&[command.as_str()]).await?;
        Ok(())
    }

    async fn watch(&self, registry: Arc<PlacementRegistry>) -> Result<()> {
        let mut child = Command::new("swaymsg")
            .args(["-t", "subscribe", "-m", r#"["window"]"#])
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HintsError::WindowSystem(format!("swaymsg не найден: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| hints_error!(internal, "swaymsg запущен без stdout"))?;

        info!("Подписка на события окон sway активна");

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                continue;
            }

            match parse_window_event(&line) {
                Ok(Some(event)) => {
                    debug_if_enabled!("Событие sway: {}", event);
                    registry.handle_window_event(self, &event).await;
                }
                Ok(None) => {}
                Err(e) => debug!("Не удалось разобрать событие sway: {}", e),
            }
        }

        Err(hints_error!(
            service_unavailable,
            "Поток событий sway завершился"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "type": "root",
        "nodes": [
            {
                "type": "output",
                "name": "eDP-1",
                "nodes": [
                    {
                        "type": "workspace",
                        "focused": false,
                        "nodes": [
                            {
                                "type": "con",
                                "id": 7,
                                "focused": false,
                                "pid": 100,
                                "app_id": "firefox",
                                "rect": {"x": 0, "y": 0, "width": 960, "height": 1080},
                                "nodes": []
                            }
                        ]
                    }
                ]
            },
            {
                "type": "output",
                "name": "DP-2",
                "nodes": [
                    {
                        "type": "workspace",
                        "focused": false,
                        "nodes": [],
                        "floating_nodes": [
                            {
                                "type": "floating_con",
                                "id": 9,
                                "focused": true,
                                "pid": 4242,
                                "app_id": "Editor",
                                "rect": {"x": 10, "y": 20, "width": 300, "height": 200},
                                "nodes": []
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    const OUTPUTS: &str = r#"[{"name": "eDP-1"}, {"name": "DP-2"}]"#;

    #[test]
    fn test_find_focused_tracks_output() {
        let tree: Value = serde_json::from_str(TREE).unwrap();
        let (node, output) = find_focused(&tree, None).unwrap();

        assert_eq!(node["id"].as_i64(), Some(9));
        assert_eq!(output, Some("DP-2"));
    }

    #[test]
    fn test_window_info_from_tree() {
        let tree: Value = serde_json::from_str(TREE).unwrap();
        let outputs: Value = serde_json::from_str(OUTPUTS).unwrap();

        let (node, output) = find_focused(&tree, None).unwrap();
        let info = window_info_from_node(node, output_index(&outputs, output));

        assert_eq!(
            info.into_reply(),
            (10, 20, 300, 200, 4242, "Editor".to_string(), 1)
        );
    }

    #[test]
    fn test_window_info_sentinels_for_missing_fields() {
        let node: Value = serde_json::from_str(
            r#"{"type": "con", "focused": true, "rect": {"x": 1, "y": 2, "width": 3, "height": 4}}"#,
        )
        .unwrap();

        let info = window_info_from_node(&node, -1);
        assert_eq!(info.pid, -1);
        assert_eq!(info.wm_class, "");
        assert_eq!(info.monitor, -1);
    }

    #[test]
    fn test_xwayland_class_fallback() {
        let node: Value = serde_json::from_str(
            r#"{"type": "con", "focused": true, "pid": 5,
                "app_id": null,
                "window_properties": {"class": "XTerm"},
                "rect": {"x": 0, "y": 0, "width": 1, "height": 1}}"#,
        )
        .unwrap();

        assert_eq!(window_info_from_node(&node, 0).wm_class, "XTerm");
    }

    #[test]
    fn test_parse_new_window_event() {
        let line = r#"{"change": "new", "container": {"id": 33, "pid": 77, "name": "Hints"}}"#;
        let event = parse_window_event(line).unwrap().unwrap();

        assert_eq!(event.event_type, WindowEventType::Created);
        assert_eq!(event.window, CreatedWindow::new("33", 77, "Hints"));
    }

    #[test]
    fn test_parse_ignores_unknown_change() {
        let line = r#"{"change": "fullscreen_mode", "container": {"id": 33}}"#;
        assert!(parse_window_event(line).unwrap().is_none());
    }

    #[test]
    fn test_output_index_unknown_is_sentinel() {
        let outputs: Value = serde_json::from_str(OUTPUTS).unwrap();
        assert_eq!(output_index(&outputs, Some("HDMI-3")), -1);
        assert_eq!(output_index(&outputs, None), -1);
    }
}
