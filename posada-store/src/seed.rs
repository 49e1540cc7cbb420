use posada_core::{BookingEngine, CoreResult, NewHotel, NewRoom, RoomType};
use serde::Deserialize;
use tracing::info;

/// Hotels and rooms loaded into a fresh engine at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub hotels: Vec<SeedHotel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedHotel {
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub rooms: Vec<SeedRoom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRoom {
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub price_per_night: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub hotels: usize,
    pub rooms: usize,
}

/// Create every seeded hotel, then its rooms, through the engine's own
/// operations. Stops at the first invalid fixture.
pub fn apply(engine: &mut BookingEngine, seed: &SeedData) -> CoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for seed_hotel in &seed.hotels {
        let hotel = engine.create_hotel(NewHotel {
            name: seed_hotel.name.clone(),
            city: seed_hotel.city.clone(),
            rating: seed_hotel.rating,
        })?;
        report.hotels += 1;

        for seed_room in &seed_hotel.rooms {
            engine.create_room(NewRoom {
                hotel_id: hotel.id,
                number: seed_room.number.clone(),
                room_type: seed_room.room_type,
                price_per_night: seed_room.price_per_night,
                available: seed_room.available,
            })?;
            report.rooms += 1;
        }
    }

    info!(hotels = report.hotels, rooms = report.rooms, "Seed data applied");
    Ok(report)
}
