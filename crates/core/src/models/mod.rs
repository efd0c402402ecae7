//! Data models for Rollcall

mod attendance;
mod check_in;
mod credential;
mod ids;
mod session;

pub use attendance::*;
pub use check_in::*;
pub use credential::*;
pub use ids::*;
pub use session::*;
