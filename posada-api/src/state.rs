use std::sync::Arc;
use posada_core::BookingEngine;
use tokio::sync::Mutex;

/// Shared handle to the engine. Every command holds the lock for its whole
/// run, so id allocation and availability updates happen as one unit.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<BookingEngine>>,
}

impl AppState {
    pub fn new(engine: BookingEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}
