use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UnknownEnumValue;

/// Claim session lifecycle. `Expired` absorbs any non-terminal state whose
/// deadline has passed; no transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimSessionStatus {
    PendingData,
    PendingPayment,
    Success,
    Cancelled,
    Expired,
}

impl ClaimSessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Cancelled | Self::Expired)
    }

    pub fn can_transition_to(&self, to: ClaimSessionStatus) -> bool {
        use ClaimSessionStatus::*;
        matches!(
            (*self, to),
            (PendingData, PendingPayment)
                | (PendingPayment, Success)
                | (PendingData | PendingPayment, Cancelled)
                | (PendingData | PendingPayment, Expired)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingData => "PENDING_DATA",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Success => "SUCCESS",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for ClaimSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimSessionStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_DATA" => Ok(Self::PendingData),
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "SUCCESS" => Ok(Self::Success),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(UnknownEnumValue {
                kind: "claim session status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid claim session transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ClaimSessionStatus,
    pub to: ClaimSessionStatus,
}

/// A time-limited hold on a set of tickets, addressed externally by its
/// opaque token. The deadline is a data-level property: enforced
/// defensively on every access and eventually by the sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSession {
    pub id: Uuid,
    pub token: Uuid,
    pub sailing_id: Uuid,
    pub status: ClaimSessionStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimSession {
    pub fn new(sailing_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token: Uuid::new_v4(),
            sailing_id,
            status: ClaimSessionStatus::PendingData,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Guarded state transition.
    pub fn advance(&mut self, to: ClaimSessionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Push the deadline out from its current value, not from now: the
    /// payment window starts where the data-entry window ended.
    pub fn extend_deadline(&mut self, by: Duration) {
        self.expires_at += by;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_session() -> ClaimSession {
        ClaimSession::new(Uuid::new_v4(), Utc::now() + Duration::minutes(13))
    }

    #[test]
    fn session_lifecycle() {
        let mut session = fresh_session();
        assert_eq!(session.status, ClaimSessionStatus::PendingData);

        session.advance(ClaimSessionStatus::PendingPayment).unwrap();
        assert_eq!(session.status, ClaimSessionStatus::PendingPayment);

        session.advance(ClaimSessionStatus::Success).unwrap();
        assert_eq!(session.status, ClaimSessionStatus::Success);
        assert!(session.status.is_terminal());
    }

    #[test]
    fn no_transition_out_of_terminal_states() {
        for terminal in [
            ClaimSessionStatus::Success,
            ClaimSessionStatus::Cancelled,
            ClaimSessionStatus::Expired,
        ] {
            let mut session = fresh_session();
            session.status = terminal;
            let err = session.advance(ClaimSessionStatus::PendingPayment).unwrap_err();
            assert_eq!(err.from, terminal);
            assert_eq!(session.status, terminal);
        }
    }

    #[test]
    fn cannot_skip_data_entry() {
        let mut session = fresh_session();
        assert!(session.advance(ClaimSessionStatus::Success).is_err());
        assert_eq!(session.status, ClaimSessionStatus::PendingData);
    }

    #[test]
    fn non_terminal_states_can_expire() {
        let mut session = fresh_session();
        session.advance(ClaimSessionStatus::Expired).unwrap();

        let mut session = fresh_session();
        session.advance(ClaimSessionStatus::PendingPayment).unwrap();
        session.advance(ClaimSessionStatus::Expired).unwrap();
    }

    #[test]
    fn deadline_extension_builds_on_the_old_deadline() {
        let mut session = fresh_session();
        let before = session.expires_at;
        session.extend_deadline(Duration::minutes(8));
        assert_eq!(session.expires_at, before + Duration::minutes(8));
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let session = fresh_session();
        assert!(session.is_expired(session.expires_at));
        assert!(!session.is_expired(session.expires_at - Duration::seconds(1)));
    }
}
