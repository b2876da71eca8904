#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod events;
pub mod state;

pub use controller::{PredictionController, SharedHistory, SubmitError};
pub use events::{NoopEvents, PredictionEvents};
pub use state::{PredictionState, PredictionStatus, Settlement};
