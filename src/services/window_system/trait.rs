use crate::config::Config;
use crate::error::Result;
use crate::events::{CreatedWindow, WindowInfo};
use crate::hints_error;
use crate::services::placement::PlacementRegistry;
use std::sync::Arc;
use tracing::info;

/// Trait for window system backends that can run in different modes
#[async_trait::async_trait]
pub trait WindowSystem: Send + Sync {
    /// Backend name, surfaced over D-Bus as the WindowSystem property
    fn name(&self) -> &'static str;

    /// Snapshot of the currently focused window, None when nothing has focus
    async fn focused_window(&self) -> Result<Option<WindowInfo>>;

    /// Move a window to an absolute position in screen coordinates
    async fn move_window(&self, window: &CreatedWindow, x: i32, y: i32) -> Result<()>;

    /// Put a window onto the monitor with the given zero-based index
    async fn assign_monitor(&self, window: &CreatedWindow, monitor: i32) -> Result<()>;

    /// Consume the compositor's window lifecycle event stream and feed it
    /// serially into the registry. Runs until the owning task is aborted.
    async fn watch(&self, registry: Arc<PlacementRegistry>) -> Result<()>;
}

#[derive(Debug, Clone)]
enum Backend {
    Sway,
    Hyprland,
}

/// Factory function to create an appropriate window system based on the
/// dry_run flag and the configured backend
pub fn create_window_system(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Arc<dyn WindowSystem>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunWindowSystem::new()));
    }

    let backend = match config.window.backend.as_str() {
        "sway" => Backend::Sway,
        "hyprland" => Backend::Hyprland,
        _ => detect_backend()?,
    };

    info!("Выбран бэкенд оконной системы: {:?}", backend);

    Ok(match backend {
        Backend::Sway => Arc::new(super::sway::SwayWindowSystem::new()),
        Backend::Hyprland => Arc::new(super::hyprland::HyprlandWindowSystem::new()),
    })
}

fn detect_backend() -> Result<Backend> {
    if std::env::var("SWAYSOCK").is_ok() {
        return Ok(Backend::Sway);
    }

    if std::env::var("HYPRLAND_INSTANCE_SIGNATURE").is_ok() {
        return Ok(Backend::Hyprland);
    }

    if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
        match desktop.to_lowercase().as_str() {
            d if d.contains("sway") => return Ok(Backend::Sway),
            d if d.contains("hyprland") => return Ok(Backend::Hyprland),
            _ => {}
        }
    }

    Err(hints_error!(
        service_unavailable,
        "Не удалось определить композитор: не найдены SWAYSOCK и HYPRLAND_INSTANCE_SIGNATURE"
    ))
}
