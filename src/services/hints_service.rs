use crate::events::WindowInfo;
use crate::services::placement::PlacementRegistry;
use crate::services::window_system::WindowSystem;
use std::sync::Arc;
use tracing::warn;
use zbus::interface;

/// Объект, экспортируемый на сессионной шине как uk.co.realh.Hints.
/// Запросы о фокусе отвечаются синхронно; PositionWindow лишь взводит
/// правило и возвращается сразу.
pub struct HintsService {
    window_system: Arc<dyn WindowSystem>,
    registry: Arc<PlacementRegistry>,
}

impl HintsService {
    pub fn new(window_system: Arc<dyn WindowSystem>, registry: Arc<PlacementRegistry>) -> Self {
        Self {
            window_system,
            registry,
        }
    }

    /// Опрос фокуса, поглощающий ошибки бэкенда: методы шины не имеют
    /// объявленных ошибок, любой сбой превращается в ответ "нет фокуса"
    async fn focused(&self) -> Option<WindowInfo> {
        match self.window_system.focused_window().await {
            Ok(window) => window,
            Err(e) => {
                warn!("Не удалось опросить сфокусированное окно: {}", e);
                None
            }
        }
    }
}

#[interface(name = "uk.co.realh.Hints")]
impl HintsService {
    /// Возвращает (x, y, width, height, pid, wm_class, monitor).
    /// Без сфокусированного окна - (0, 0, 0, 0, -1, "", -1).
    #[zbus(out_args("x", "y", "width", "height", "pid", "wm_class", "monitor"))]
    async fn focused_window_info(&self) -> (i32, i32, i32, i32, i32, String, i32) {
        self.focused()
            .await
            .unwrap_or_else(WindowInfo::no_focus)
            .into_reply()
    }

    /// Только рамка сфокусированного окна; (0, 0, 0, 0) без фокуса
    #[zbus(out_args("x", "y", "width", "height"))]
    async fn focused_window_extents(&self) -> (i32, i32, i32, i32) {
        self.focused()
            .await
            .map(|window| window.extents())
            .unwrap_or((0, 0, 0, 0))
    }

    /// pid сфокусированного окна; -1 без фокуса
    async fn focused_window_pid(&self) -> i32 {
        self.focused().await.map(|window| window.pid).unwrap_or(-1)
    }

    /// Имя сфокусированного приложения (wm_class); "" без фокуса
    async fn focused_application_name(&self) -> String {
        self.focused()
            .await
            .map(|window| window.wm_class)
            .unwrap_or_default()
    }

    /// Взвести одноразовое правило: первое созданное окно с точно
    /// совпавшими pid и title будет перемещено в (x, y) на монитор monitor.
    /// Диапазоны не проверяются - этим занимается оконная система.
    fn position_window(&self, x: i32, y: i32, monitor: i32, pid: i32, title: String) {
        self.registry.arm(x, y, monitor, pid, title);
    }

    /// Имя активного бэкенда оконной системы
    #[zbus(property)]
    async fn window_system(&self) -> String {
        self.window_system.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CreatedWindow, WindowEvent};
    use crate::services::window_system::DryRunWindowSystem;

    fn make_service() -> (Arc<DryRunWindowSystem>, Arc<PlacementRegistry>, HintsService) {
        let ws = Arc::new(DryRunWindowSystem::new());
        let registry = Arc::new(PlacementRegistry::new());
        let service = HintsService::new(ws.clone(), registry.clone());
        (ws, registry, service)
    }

    #[tokio::test]
    async fn test_focused_window_info_sentinel() {
        let (_ws, _registry, service) = make_service();

        assert_eq!(
            service.focused_window_info().await,
            (0, 0, 0, 0, -1, String::new(), -1)
        );
        assert_eq!(service.focused_window_extents().await, (0, 0, 0, 0));
        assert_eq!(service.focused_window_pid().await, -1);
        assert_eq!(service.focused_application_name().await, "");
    }

    #[tokio::test]
    async fn test_focused_window_info_snapshot() {
        let (ws, _registry, service) = make_service();

        ws.set_focused(Some(WindowInfo {
            x: 10,
            y: 20,
            width: 300,
            height: 200,
            pid: 4242,
            wm_class: "Editor".to_string(),
            monitor: 1,
        }));

        assert_eq!(
            service.focused_window_info().await,
            (10, 20, 300, 200, 4242, "Editor".to_string(), 1)
        );
        assert_eq!(service.focused_window_extents().await, (10, 20, 300, 200));
        assert_eq!(service.focused_window_pid().await, 4242);
        assert_eq!(service.focused_application_name().await, "Editor");
    }

    #[tokio::test]
    async fn test_position_window_arms_rule() {
        let (ws, registry, service) = make_service();

        service.position_window(100, 50, 1, 42, "Hints".to_string());
        assert_eq!(registry.pending(), 1);

        registry
            .handle_window_event(
                &*ws,
                &WindowEvent::created(CreatedWindow::new("w1", 42, "Hints")),
            )
            .await;

        let moves = ws.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!((moves[0].1, moves[0].2), (100, 50));
        assert_eq!(ws.monitor_assignments()[0].1, 1);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test]
    async fn test_window_system_property() {
        let (_ws, _registry, service) = make_service();
        assert_eq!(service.window_system().await, "dry-run");
    }
}
