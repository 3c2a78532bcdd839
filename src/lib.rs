//! opendecks - Open-decks DJ kiosk
//!
//! Signup collection and fair slot draws for an open-decks night: artists
//! sign up at a shared kiosk, and two playing windows are filled by a random
//! draw that caps male and duo sets at half of each window.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`scheduler`] - Night plan, slot generation, signup registry and the draw
//! - [`store`] - Shared session state, admin gate and change events
//! - [`export`] - CSV export of the signup list
//! - [`error`] - Crate-level error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use opendecks::config::Config;
//! use opendecks::models::Category;
//! use opendecks::store::NightStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = NightStore::with_zone_clock(config)?;
//!     store.submit_signup("DJ Example", Some(Category::Female)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Assignment, Category, NightState, Participant, Slot, WindowId};
    pub use crate::scheduler::{AutoTrigger, Clock, NightError, NightPlan, NightResult, ZoneClock};
    pub use crate::store::{NightStore, StoreEvent};
}

// Direct re-exports for convenience
pub use models::{Category, NightState, WindowId};
