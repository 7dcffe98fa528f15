//! PlacementRegistry holds the pending placement rules armed by PositionWindow.
//!
//! Responsibilities (strict):
//! - Keep N independent single-fire rules, each matched by exact (pid, title)
//!   equality against newly created windows.
//! - Fire a rule at most once: the released flag is claimed BEFORE acting, so
//!   a racing second creation event can never fire the same rule.
//! - Drain every outstanding rule on teardown; a drained registry ignores all
//!   further events.
//! - Do NOT talk to the compositor directly; move/assign go through the
//!   WindowSystem handed in with each event.
//!
//! A rule that never matches stays armed for the process lifetime. There is
//! no per-rule cancel or timeout.

use crate::debug_if_enabled;
use crate::events::{CreatedWindow, WindowEvent, WindowEventType};
use crate::services::window_system::WindowSystem;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Одноразовое правило позиционирования будущего окна
#[derive(Debug)]
pub struct PlacementRule {
    id: u64,
    x: i32,
    y: i32,
    monitor: i32,
    pid: i32,
    title: String,
    released: AtomicBool,
}

impl PlacementRule {
    fn new(id: u64, x: i32, y: i32, monitor: i32, pid: i32, title: String) -> Self {
        Self {
            id,
            x,
            y,
            monitor,
            pid,
            title,
            released: AtomicBool::new(false),
        }
    }

    #[allow(dead_code)]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Точное совпадение (pid, title), с учётом регистра
    fn matches(&self, window: &CreatedWindow) -> bool {
        self.pid == window.pid && self.title == window.title
    }

    /// Снять подписку. Возвращает true ровно один раз, сколько бы раз
    /// её ни вызывали.
    fn release(&self) -> bool {
        !self.released.swap(true, Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct PlacementRegistry {
    rules: DashMap<u64, Arc<PlacementRule>>,
    next_id: AtomicU64,
}

impl Default for PlacementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementRegistry {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Взвести правило. Возвращённый id и есть хэндл подписки.
    pub fn arm(&self, x: i32, y: i32, monitor: i32, pid: i32, title: String) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rule = Arc::new(PlacementRule::new(id, x, y, monitor, pid, title));

        info!(
            "Правило #{} взведено: pid={} title=\"{}\" -> ({}, {}), монитор {}",
            id, rule.pid, rule.title, rule.x, rule.y, rule.monitor
        );

        self.rules.insert(id, rule);
        id
    }

    /// Количество взведённых правил
    pub fn pending(&self) -> usize {
        self.rules.len()
    }

    /// Обработать событие оконной системы. На событие создания окна
    /// срабатывает не более одного правила - самое раннее из совпавших.
    pub async fn handle_window_event(
        &self,
        window_system: &dyn WindowSystem,
        event: &WindowEvent,
    ) {
        if event.event_type != WindowEventType::Created {
            debug_if_enabled!("Событие {:?} пропущено", event.event_type);
            return;
        }

        let window = &event.window;

        let mut matched: Vec<Arc<PlacementRule>> = self
            .rules
            .iter()
            .filter(|entry| entry.value().matches(window))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|rule| rule.id);

        if matched.is_empty() {
            debug_if_enabled!(
                "Окно {} не совпало ни с одним из {} правил",
                window,
                self.rules.len()
            );
            return;
        }

        for rule in matched {
            // Сначала забираем правило, потом действуем: параллельное событие
            // с тем же ключом не может выстрелить его второй раз
            if !rule.release() {
                continue;
            }

            info!("Правило #{} сработало на окне {}", rule.id, window);

            // Позднюю ошибку некому вернуть - вызов PositionWindow давно
            // завершился. Логируем и живём дальше.
            if let Err(e) = window_system.move_window(window, rule.x, rule.y).await {
                warn!(
                    "Правило #{}: не удалось переместить окно {}: {}",
                    rule.id, window, e
                );
            }

            if let Err(e) = window_system.assign_monitor(window, rule.monitor).await {
                warn!(
                    "Правило #{}: не удалось назначить окну {} монитор {}: {}",
                    rule.id, window, rule.monitor, e
                );
            }

            self.rules.remove(&rule.id);

            if !self.rules.is_empty() {
                info!("Осталось взведённых правил: {}", self.rules.len());
            }

            return;
        }
    }

    /// Снять все подписки. Вызывается на остановке сервиса, до разрушения
    /// источника событий. Повторный вызов безопасен.
    pub fn drain(&self) -> usize {
        let mut released = 0;
        for entry in self.rules.iter() {
            if entry.value().release() {
                released += 1;
            }
        }
        self.rules.clear();

        if released > 0 {
            info!("Снято незавершённых правил: {}", released);
        }

        released
    }
}
