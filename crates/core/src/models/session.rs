//! Scheduled class meeting model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::SessionId;
use crate::error::{Error, Result};

/// A scheduled class meeting
///
/// Sessions are owned by course scheduling; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Per-session grace period; `None` falls back to the global policy
    pub grace_minutes: Option<u32>,
}

impl Session {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self> {
        if end_time <= start_time {
            return Err(Error::InvalidInput(format!(
                "session must end after it starts ({} >= {})",
                start_time, end_time
            )));
        }

        Ok(Self {
            id: SessionId::new(),
            start_time,
            end_time,
            grace_minutes: None,
        })
    }

    pub fn with_grace_minutes(mut self, minutes: u32) -> Self {
        self.grace_minutes = Some(minutes);
        self
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    /// Latest check-in time that still counts as on time
    pub fn on_time_deadline(&self, default_grace_minutes: u32) -> DateTime<Utc> {
        let grace = self.grace_minutes.unwrap_or(default_grace_minutes);
        self.start_time + Duration::minutes(i64::from(grace))
    }
}
