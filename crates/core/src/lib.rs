//! Rollcall Core Library
//!
//! Credential issuance, check-in validation, attendance classification and
//! storage for QR-based class attendance.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod invariants;
pub mod issuer;
pub mod models;
pub mod retry;
pub mod service;
pub mod storage;
pub mod validator;

pub use classifier::AttendanceClassifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AfterEndPolicy, PolicyConfig, RetryConfig};
pub use error::{Error, Result};
pub use issuer::TokenIssuer;
pub use models::*;
pub use service::AttendanceService;
pub use storage::{
    AttendanceStore, CredentialIndex, Database, EventStore, MemoryStore, SessionLookup,
    SqliteStore,
};
pub use validator::CheckInValidator;
