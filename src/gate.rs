//! Access gates: the long-lived admin session and the per-selection PIN
//! challenge that unlocks document generation.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{OutingError, Result};
use crate::store::KvBackend;

pub const ADMIN_SESSION_KEY: &str = "adminSession";
pub const PIN_LENGTH: usize = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminCredentials {
    pub session_id: String,
    pub mobile: String,
    pub answer: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("session_id", &self.session_id)
            .field("mobile", &self.mobile)
            .field("answer", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Session id and mobile must match exactly; the answer ignores case.
    pub fn matches(&self, session_id: &str, mobile: &str, answer: &str) -> bool {
        session_id.trim() == self.session_id
            && mobile.trim() == self.mobile
            && answer.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdminState {
    LoggedOut,
    LoggedIn,
}

/// Admin session gate. The logged-in flag is durable and survives restarts
/// until an explicit logout.
pub struct AdminGate<K: KvBackend> {
    backend: K,
    credentials: AdminCredentials,
    state: AdminState,
}

impl<K: KvBackend> AdminGate<K> {
    pub fn open(backend: K, credentials: AdminCredentials) -> Result<Self> {
        let state = match backend.get(ADMIN_SESSION_KEY)?.as_deref() {
            Some("true") => AdminState::LoggedIn,
            _ => AdminState::LoggedOut,
        };
        Ok(Self {
            backend,
            credentials,
            state,
        })
    }

    pub fn state(&self) -> AdminState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == AdminState::LoggedIn
    }

    pub fn require(&self) -> Result<()> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(OutingError::AdminRequired)
        }
    }

    pub fn set_credentials(&mut self, credentials: AdminCredentials) {
        self.credentials = credentials;
    }

    pub fn verify(&mut self, session_id: &str, mobile: &str, answer: &str) -> Result<()> {
        if !self.credentials.matches(session_id, mobile, answer) {
            return Err(OutingError::InvalidCredentials);
        }
        self.backend.set(ADMIN_SESSION_KEY, "true")?;
        self.state = AdminState::LoggedIn;
        info!("admin session started");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.backend.remove(ADMIN_SESSION_KEY)?;
        self.state = AdminState::LoggedOut;
        info!("admin session ended");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PinStatus {
    Idle,
    Entering,
    Success,
    Error,
    NotConfigured,
}

#[derive(Debug, Clone, Copy)]
struct PendingReset {
    due: Instant,
}

/// PIN challenge for the current selection.
///
/// After a mismatch the gate sits in `Error` with a one-shot reset due
/// `retry_delay` later. Any digit, backspace or selection change cancels
/// that reset, so a stale one can never clobber newer input.
#[derive(Debug, Clone)]
pub struct PinGate {
    status: PinStatus,
    buffer: String,
    pending: Option<PendingReset>,
    retry_delay: Duration,
}

impl Default for PinGate {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

impl PinGate {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            status: PinStatus::Idle,
            buffer: String::with_capacity(PIN_LENGTH),
            pending: None,
            retry_delay,
        }
    }

    pub fn status(&self) -> PinStatus {
        self.status
    }

    pub fn entered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_unlocked(&self) -> bool {
        self.status == PinStatus::Success
    }

    pub fn reset_due(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    pub fn set_retry_delay(&mut self, retry_delay: Duration) {
        self.retry_delay = retry_delay;
    }

    /// Fresh challenge for a newly selected student.
    pub fn begin(&mut self) {
        self.pending = None;
        self.buffer.clear();
        self.status = PinStatus::Entering;
    }

    /// No student selected.
    pub fn clear(&mut self) {
        self.pending = None;
        self.buffer.clear();
        self.status = PinStatus::Idle;
    }

    pub fn enter_digit(
        &mut self,
        digit: char,
        expected: Option<&str>,
        now: Instant,
    ) -> Result<PinStatus> {
        if !digit.is_ascii_digit() {
            return Err(OutingError::BadDigit(digit.to_string()));
        }
        match self.status {
            PinStatus::Idle => return Err(OutingError::NoSelection),
            PinStatus::Success => return Ok(PinStatus::Success),
            PinStatus::NotConfigured => return Err(OutingError::PinNotConfigured),
            PinStatus::Error => self.begin(),
            PinStatus::Entering => {}
        }

        self.buffer.push(digit);
        if self.buffer.len() < PIN_LENGTH {
            return Ok(PinStatus::Entering);
        }

        let Some(expected) = expected else {
            self.buffer.clear();
            self.status = PinStatus::NotConfigured;
            return Err(OutingError::PinNotConfigured);
        };
        if self.buffer == expected {
            self.status = PinStatus::Success;
            Ok(PinStatus::Success)
        } else {
            self.status = PinStatus::Error;
            self.pending = Some(PendingReset {
                due: now + self.retry_delay,
            });
            Err(OutingError::PinMismatch)
        }
    }

    pub fn backspace(&mut self) -> PinStatus {
        match self.status {
            PinStatus::Entering => {
                self.buffer.pop();
            }
            PinStatus::Error => self.begin(),
            _ => {}
        }
        self.status
    }

    /// Fires the pending reset if it is due. Returns true when it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(p) if now >= p.due => {
                self.begin();
                true
            }
            _ => false,
        }
    }
}
