pub mod kiosk;
pub mod windows;

// Re-export command functions for convenience
pub use kiosk::kiosk;
pub use windows::windows;
