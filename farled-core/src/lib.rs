pub mod booking;
pub mod sailing;
pub mod session;
pub mod store;
pub mod ticket;

use uuid::Uuid;

use crate::session::ClaimSessionStatus;
use crate::store::BoxError;

/// Error taxonomy of the reservation engine. `Conflict` and `Expired`
/// outcomes are routine under load and carry enough detail for a client to
/// act on them; `Storage` wraps anything the persistence layer reports.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not enough slots for class {class_id}: available {available}, requested {requested}")]
    InsufficientCapacity {
        class_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("claim session expired")]
    SessionExpired,

    #[error("claim session is {status}; operation not allowed in this state")]
    InvalidState { status: ClaimSessionStatus },

    #[error("storage error: {0}")]
    Storage(#[from] BoxError),
}

impl From<session::InvalidTransition> for ReservationError {
    fn from(err: session::InvalidTransition) -> Self {
        Self::InvalidState { status: err.from }
    }
}

pub type ReservationResult<T> = Result<T, ReservationError>;

/// Raised when a persisted enum column holds a value no variant maps to.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct UnknownEnumValue {
    pub kind: &'static str,
    pub value: String,
}
