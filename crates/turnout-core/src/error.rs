use crate::types::enums::EventStatus;
use crate::types::ids::IdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event not found")]
    NotFound,
    #[error("event is cancelled")]
    Cancelled,
    #[error("event has ended")]
    Ended,
    #[error("invalid status change from {from} to {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },
    #[error("caller is not permitted to {action}")]
    Forbidden { action: &'static str },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum AttendeeError {
    #[error("attendee not found")]
    NotFound,
    #[error("attendee already has an rsvp")]
    AlreadyExists,
    #[error("would exceed capacity: requested {requested}, available {available}")]
    CapacityExceeded { requested: u32, available: u32 },
    #[error("guest count cannot change while waitlisted")]
    WaitlistedGuestChange,
    #[error("guest count only applies to going rsvps")]
    NotGoing,
    #[error("caller is not permitted to {action}")]
    Forbidden { action: &'static str },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Caller-facing classification of every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidOperation,
    NotFound,
    Forbidden,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidOperation => "invalid_operation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum TurnoutError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Attendee(#[from] AttendeeError),
    #[error("unavailable: {message}")]
    Unavailable { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<IdError> for TurnoutError {
    fn from(value: IdError) -> Self {
        TurnoutError::Attendee(AttendeeError::InvalidInput {
            message: value.to_string(),
        })
    }
}

impl TurnoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Event(err) => match err {
                EventError::NotFound => ErrorKind::NotFound,
                EventError::Cancelled
                | EventError::Ended
                | EventError::InvalidTransition { .. } => ErrorKind::InvalidOperation,
                EventError::Forbidden { .. } => ErrorKind::Forbidden,
                EventError::InvalidInput { .. } => ErrorKind::InvalidArgument,
            },
            Self::Attendee(err) => match err {
                AttendeeError::NotFound => ErrorKind::NotFound,
                AttendeeError::AlreadyExists
                | AttendeeError::CapacityExceeded { .. }
                | AttendeeError::WaitlistedGuestChange
                | AttendeeError::NotGoing => ErrorKind::InvalidOperation,
                AttendeeError::Forbidden { .. } => ErrorKind::Forbidden,
                AttendeeError::InvalidInput { .. } => ErrorKind::InvalidArgument,
            },
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Storage { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let cases: Vec<(TurnoutError, ErrorKind)> = vec![
            (EventError::Cancelled.into(), ErrorKind::InvalidOperation),
            (EventError::NotFound.into(), ErrorKind::NotFound),
            (
                AttendeeError::CapacityExceeded {
                    requested: 2,
                    available: 1,
                }
                .into(),
                ErrorKind::InvalidOperation,
            ),
            (
                AttendeeError::Forbidden {
                    action: "remove attendee",
                }
                .into(),
                ErrorKind::Forbidden,
            ),
            (
                IdError::InvalidUlid {
                    value: "usr_x".to_string(),
                }
                .into(),
                ErrorKind::InvalidArgument,
            ),
            (
                TurnoutError::Unavailable {
                    message: "lock".to_string(),
                },
                ErrorKind::Unavailable,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn capacity_message_is_explicit() {
        let err = TurnoutError::from(AttendeeError::CapacityExceeded {
            requested: 3,
            available: 1,
        });
        assert_eq!(
            err.to_string(),
            "would exceed capacity: requested 3, available 1"
        );
    }
}
