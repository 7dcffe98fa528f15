pub mod hints_service;
pub mod placement;
pub mod window_system;

pub use hints_service::HintsService;
pub use placement::PlacementRegistry;
pub use window_system::create_window_system;
