//! HTTP request handlers.

pub mod liveness;
pub mod system;
pub mod traffic;
pub mod wipe;

pub use liveness::*;
pub use system::*;
pub use traffic::*;
pub use wipe::*;
