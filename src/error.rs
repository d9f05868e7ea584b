//! Error handling for the inventory ingestion client

use std::fmt;
use thiserror::Error;

/// Why a level-2 space was refused a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRejection {
    /// No space with the declared id is known
    Missing,
    /// The declared parent exists but is itself a location
    NotARoom,
    /// The declared parent belongs to another user
    NotOwned,
}

impl fmt::Display for ParentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParentRejection::Missing => "parent does not exist",
            ParentRejection::NotARoom => "parent is not a room",
            ParentRejection::NotOwned => "parent is not owned by the current user",
        };
        f.write_str(text)
    }
}

/// Coarse error categories, stable enough to branch on in tests and callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any network call
    Validation,
    /// No resolvable room/location for one or more candidates
    Placement,
    /// The referenced resource belongs to another user
    Ownership,
    /// The session is missing or was rejected by the server (401)
    Authentication,
    /// The server answered with a non-2xx status other than 401
    Service,
    /// The request never produced a response
    Transport,
    /// The request exceeded its configured timeout
    Timeout,
    /// A response body could not be decoded
    Decode,
    /// Client configuration is invalid
    Config,
    /// A room's locations were deleted but the room itself was not
    PartialDeletion,
}

/// Unified error type for the inventory client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Access token decoding errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// A request did not complete within its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A transport failure carried over from a shared request
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response body that could not be decoded, carried over from a shared request
    #[error("Decode error: {0}")]
    Decode(String),

    /// Missing or rejected credentials
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// The resource does not exist or is not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response from the inventory service
    #[error("Service error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message taken from the `{ "error": ... }` envelope
        message: String,
    },

    /// Input rejected before it reached the network
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Candidates without a complete room/location selection
    #[error("Missing placement for: {}", .unresolved.join(", "))]
    MissingPlacement {
        /// Names of the candidates that could not be placed
        unresolved: Vec<String>,
    },

    /// A location selection that is not a child of the selected room
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    /// A level-2 space declared an unusable parent
    #[error("Invalid parent {parent_id}: {reason}")]
    InvalidParent {
        /// The declared parent id
        parent_id: String,
        /// Why it was refused
        reason: ParentRejection,
    },

    /// Every location of the room was deleted, the room itself was not
    #[error("Room {room_id} not deleted after removing {} location(s): {source}", .locations_deleted.len())]
    RoomDeletionIncomplete {
        /// The room that still exists
        room_id: String,
        /// Locations that are already gone
        locations_deleted: Vec<String>,
        /// The failure of the room delete
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new authentication error
    pub fn unauthorized<T: fmt::Display>(msg: T) -> Self {
        Error::Unauthorized(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new service error from a status code and message
    pub fn api<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Error::Http(e) if e.is_decode() => ErrorKind::Decode,
            Error::Http(_) | Error::Transport(_) => ErrorKind::Transport,
            Error::Json(_) | Error::Decode(_) => ErrorKind::Decode,
            Error::Url(_) | Error::Config(_) => ErrorKind::Config,
            Error::Jwt(_) | Error::Unauthorized(_) => ErrorKind::Authentication,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::NotFound(_) | Error::Api { .. } => ErrorKind::Service,
            Error::Validation(_) => ErrorKind::Validation,
            Error::MissingPlacement { .. } | Error::InvalidPlacement(_) => ErrorKind::Placement,
            Error::InvalidParent {
                reason: ParentRejection::NotOwned,
                ..
            } => ErrorKind::Ownership,
            Error::InvalidParent { .. } => ErrorKind::Validation,
            Error::RoomDeletionIncomplete { .. } => ErrorKind::PartialDeletion,
        }
    }

    /// Whether this error should stop every remaining request of a batch
    pub fn halts_batch(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Whether a sibling operation may proceed after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Service | ErrorKind::Transport | ErrorKind::Timeout | ErrorKind::Decode
        )
    }

    /// Build an owned equivalent of this error.
    ///
    /// Foreign error types are not `Clone`; they are flattened into the
    /// string-carrying variant of the same kind, so `kind()` is preserved.
    pub fn duplicate(&self) -> Error {
        match self {
            Error::Http(e) if e.is_timeout() => Error::Timeout(e.to_string()),
            Error::Http(e) if e.is_decode() => Error::Decode(e.to_string()),
            Error::Http(e) => Error::Transport(e.to_string()),
            Error::Json(e) => Error::Decode(e.to_string()),
            Error::Decode(m) => Error::Decode(m.clone()),
            Error::Url(e) => Error::Config(e.to_string()),
            Error::Jwt(e) => Error::Unauthorized(e.to_string()),
            Error::Timeout(m) => Error::Timeout(m.clone()),
            Error::Transport(m) => Error::Transport(m.clone()),
            Error::Unauthorized(m) => Error::Unauthorized(m.clone()),
            Error::NotFound(m) => Error::NotFound(m.clone()),
            Error::Api { status, message } => Error::Api {
                status: *status,
                message: message.clone(),
            },
            Error::Validation(m) => Error::Validation(m.clone()),
            Error::MissingPlacement { unresolved } => Error::MissingPlacement {
                unresolved: unresolved.clone(),
            },
            Error::InvalidPlacement(m) => Error::InvalidPlacement(m.clone()),
            Error::InvalidParent { parent_id, reason } => Error::InvalidParent {
                parent_id: parent_id.clone(),
                reason: *reason,
            },
            Error::RoomDeletionIncomplete {
                room_id,
                locations_deleted,
                source,
            } => Error::RoomDeletionIncomplete {
                room_id: room_id.clone(),
                locations_deleted: locations_deleted.clone(),
                source: Box::new(source.duplicate()),
            },
            Error::Config(m) => Error::Config(m.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_halts_but_service_errors_do_not() {
        assert!(Error::unauthorized("expired").halts_batch());
        assert!(!Error::api(500, "boom").halts_batch());
        assert!(Error::api(500, "boom").is_recoverable());
        assert!(!Error::validation("empty name").is_recoverable());
    }

    #[test]
    fn parent_rejection_kind_depends_on_reason() {
        let foreign = Error::InvalidParent {
            parent_id: "r1".into(),
            reason: ParentRejection::NotOwned,
        };
        let missing = Error::InvalidParent {
            parent_id: "r1".into(),
            reason: ParentRejection::Missing,
        };
        assert_eq!(foreign.kind(), ErrorKind::Ownership);
        assert_eq!(missing.kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicate_keeps_kind() {
        let err = Error::RoomDeletionIncomplete {
            room_id: "r1".into(),
            locations_deleted: vec!["l1".into()],
            source: Box::new(Error::api(500, "db down")),
        };
        let copy = err.duplicate();
        assert_eq!(copy.kind(), ErrorKind::PartialDeletion);
        assert_eq!(copy.to_string(), err.to_string());
    }

    #[test]
    fn missing_placement_lists_names() {
        let err = Error::MissingPlacement {
            unresolved: vec!["苹果".into(), "Kettle".into()],
        };
        assert_eq!(err.to_string(), "Missing placement for: 苹果, Kettle");
    }

    #[test]
    fn flattened_copies_keep_their_kind() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let errors = vec![
            Error::Json(json),
            Error::Url(url::Url::parse("not a url").unwrap_err()),
            Error::Timeout("30s".into()),
            Error::unauthorized("expired"),
            Error::api(503, "busy"),
            Error::MissingPlacement {
                unresolved: vec!["Milk".into()],
            },
        ];
        for error in errors {
            assert_eq!(error.duplicate().kind(), error.kind(), "{}", error);
        }
    }
}
