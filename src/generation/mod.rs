//! Streaming generation
//!
//! Phase machine, stream events, cooperative cancellation, and the
//! controller that drives a request end to end.

pub mod cancel;
pub mod controller;
pub mod events;
pub mod state;

// Re-export commonly used types
pub use cancel::CancelHandle;
pub use controller::{ControllerConfig, GenerationController, StreamingAnswer};
pub use events::StreamEvent;
pub use state::{GenerationPhase, PhaseEvent};
