//! WindowSystem service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the
//! compositor: reading the currently focused window, streaming window
//! lifecycle events and executing move/assign-monitor commands. It MUST NOT
//! contain any placement matching logic. All match/fire decisions are made
//! exclusively by PlacementRegistry.

mod dry_run;
mod hyprland;
mod sway;
mod r#trait;

pub use self::dry_run::DryRunWindowSystem;
pub use self::r#trait::{create_window_system, WindowSystem};
