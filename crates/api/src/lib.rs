//! Rollcall API Library
//!
//! JSON request/response layer over the attendance service.
//!
//! # Architecture
//!
//! - **Protocol**: `type`-tagged JSON messages with camelCase fields
//! - **Gateway**: Decodes requests and calls the service
//! - **Check-in link**: The QR payload for an issued credential
//!
//! # Usage
//!
//! ```ignore
//! let gateway = Gateway::new(service);
//! let response = gateway.handle_bytes(br#"{"type":"prune_credentials"}"#);
//! println!("{}", String::from_utf8_lossy(&response.to_bytes()?));
//! ```

pub mod check_in_link;
pub mod error;
pub mod gateway;
pub mod protocol;

pub use check_in_link::CheckInLink;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use protocol::{Request, Response};
