pub mod models;
pub mod dates;
pub mod engine;
pub mod summary;

pub use models::{Booking, BookingStatus, Guest, Hotel, NewBooking, NewGuest, NewHotel, NewRoom, Room, RoomType};
pub use engine::{BookingEngine, EngineSettings};
pub use summary::OccupancySummary;

/// Entity kinds, used to report which collection a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Hotel,
    Room,
    Booking,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Hotel => write!(f, "Hotel"),
            EntityKind::Room => write!(f, "Room"),
            EntityKind::Booking => write!(f, "Booking"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: u64 },
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },
    #[error("Room {0} is not available")]
    RoomUnavailable(u64),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(kind: EntityKind, id: u64) -> Self {
        CoreError::NotFound { kind, id }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
