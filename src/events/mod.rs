pub mod window;

pub use window::{CreatedWindow, WindowEvent, WindowEventType, WindowInfo};
