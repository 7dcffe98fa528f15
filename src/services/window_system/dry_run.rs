use crate::error::Result;
use crate::events::{CreatedWindow, WindowEvent, WindowInfo};
use crate::services::placement::PlacementRegistry;
use crate::services::window_system::WindowSystem;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::info;

/// Фейковая оконная система для dry-run и тестов: фокус задаётся вручную,
/// события создания окон инжектируются, перемещения только записываются.
pub struct DryRunWindowSystem {
    focused: RwLock<Option<WindowInfo>>,
    moves: Mutex<Vec<(CreatedWindow, i32, i32)>>,
    monitor_assignments: Mutex<Vec<(CreatedWindow, i32)>>,
    inject_tx: mpsc::UnboundedSender<WindowEvent>,
    inject_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<WindowEvent>>,
}

impl Default for DryRunWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunWindowSystem {
    pub fn new() -> Self {
        let (inject_tx, inject_rx) = mpsc::unbounded_channel();
        Self {
            focused: RwLock::new(None),
            moves: Mutex::new(Vec::new()),
            monitor_assignments: Mutex::new(Vec::new()),
            inject_tx,
            inject_rx: tokio::sync::Mutex::new(inject_rx),
        }
    }

    pub fn set_focused(&self, window: Option<WindowInfo>) {
        *self.focused.write() = window;
    }

    /// Подбросить событие в поток watch()
    pub fn inject(&self, event: WindowEvent) {
        let _ = self.inject_tx.send(event);
    }

    pub fn moves(&self) -> Vec<(CreatedWindow, i32, i32)> {
        self.moves.lock().clone()
    }

    pub fn monitor_assignments(&self) -> Vec<(CreatedWindow, i32)> {
        self.monitor_assignments.lock().clone()
    }
}

#[async_trait::async_trait]
impl WindowSystem for DryRunWindowSystem {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn focused_window(&self) -> Result<Option<WindowInfo>> {
        Ok(self.focused.read().clone())
    }

    async fn move_window(&self, window: &CreatedWindow, x: i32, y: i32) -> Result<()> {
        info!("[DRY RUN] Перемещение окна {} в ({}, {})", window, x, y);
        self.moves.lock().push((window.clone(), x, y));
        Ok(())
    }

    async fn assign_monitor(&self, window: &CreatedWindow, monitor: i32) -> Result<()> {
        info!("[DRY RUN] Окно {} на монитор {}", window, monitor);
        self.monitor_assignments.lock().push((window.clone(), monitor));
        Ok(())
    }

    async fn watch(&self, registry: Arc<PlacementRegistry>) -> Result<()> {
        info!("Dry-run режим - WindowSystem работает в режиме эмуляции");

        let mut inject_rx = self.inject_rx.lock().await;
        let mut ticker = interval(Duration::from_secs(10));
        let mut counter = 0u64;

        loop {
            tokio::select! {
                maybe_event = inject_rx.recv() => match maybe_event {
                    Some(event) => registry.handle_window_event(self, &event).await,
                    None => return Ok(()),
                },
                _ = ticker.tick() => {
                    counter += 1;
                    let fake = CreatedWindow::new(
                        format!("dry-{}", counter),
                        -1,
                        format!("dry_run #{}", counter),
                    );
                    info!("Dry-run: эмулируем создание окна {}", fake);
                    registry.handle_window_event(self, &WindowEvent::created(fake)).await;
                }
            }
        }
    }
}
