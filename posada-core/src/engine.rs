use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::{debug, info};

use crate::dates::parse_stay;
use crate::models::{Booking, BookingStatus, Guest, Hotel, NewBooking, NewHotel, NewRoom, Room};
use crate::summary::OccupancySummary;
use crate::{CoreError, CoreResult, EntityKind};

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Reject rooms whose hotel does not exist.
    #[serde(default = "default_require_known_hotel")]
    pub require_known_hotel: bool,
}

fn default_require_known_hotel() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            require_known_hotel: default_require_known_hotel(),
        }
    }
}

/// Owns hotels, rooms and bookings and keeps room availability in step with
/// booking status.
///
/// Collections are keyed by id. Ids come from one counter shared by every
/// entity kind, so map order is creation order.
#[derive(Debug)]
pub struct BookingEngine {
    settings: EngineSettings,
    next_id: u64,
    hotels: BTreeMap<u64, Hotel>,
    rooms: BTreeMap<u64, Room>,
    bookings: BTreeMap<u64, Booking>,
    // Rooms whose availability was switched off by a booking, as opposed to
    // rooms created unavailable.
    held_rooms: BTreeSet<u64>,
}

impl BookingEngine {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            next_id: 1,
            hotels: BTreeMap::new(),
            rooms: BTreeMap::new(),
            bookings: BTreeMap::new(),
            held_rooms: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // Only called once all validation has passed.
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn create_hotel(&mut self, req: NewHotel) -> CoreResult<Hotel> {
        require_text("name", &req.name)?;
        require_text("city", &req.city)?;
        if let Some(rating) = req.rating {
            if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
                return Err(CoreError::validation(format!(
                    "rating must be between 0 and 5, got {}",
                    rating
                )));
            }
        }

        let hotel = Hotel {
            id: self.allocate_id(),
            name: req.name,
            city: req.city,
            rating: req.rating,
        };
        self.hotels.insert(hotel.id, hotel.clone());

        info!(hotel_id = hotel.id, city = %hotel.city, "Hotel created");
        Ok(hotel)
    }

    pub fn create_room(&mut self, req: NewRoom) -> CoreResult<Room> {
        require_text("number", &req.number)?;
        if !req.price_per_night.is_finite() || req.price_per_night < 0.0 {
            return Err(CoreError::validation(format!(
                "pricePerNight must be a non-negative amount, got {}",
                req.price_per_night
            )));
        }
        if self.settings.require_known_hotel && !self.hotels.contains_key(&req.hotel_id) {
            return Err(CoreError::not_found(EntityKind::Hotel, req.hotel_id));
        }

        let room = Room {
            id: self.allocate_id(),
            hotel_id: req.hotel_id,
            number: req.number,
            room_type: req.room_type,
            price_per_night: req.price_per_night,
            available: req.available,
        };
        self.rooms.insert(room.id, room.clone());

        info!(room_id = room.id, hotel_id = room.hotel_id, "Room created");
        Ok(room)
    }

    /// Create a booking in `initial_status`.
    ///
    /// A booking created as `confirmed` takes its room off the market. The
    /// room's current availability is not checked here.
    pub fn create_booking(&mut self, req: NewBooking, initial_status: BookingStatus) -> CoreResult<Booking> {
        let (check_in, check_out) = parse_stay(&req.check_in, &req.check_out)?;
        require_text("guest name", &req.guest.name)?;
        if !req.guest.email.contains('@') {
            return Err(CoreError::validation(format!(
                "guest email '{}' is not a valid address",
                req.guest.email
            )));
        }
        if !self.rooms.contains_key(&req.room_id) {
            return Err(CoreError::not_found(EntityKind::Room, req.room_id));
        }

        let guest = Guest {
            id: self.allocate_id(),
            name: req.guest.name,
            email: req.guest.email,
        };
        let booking = Booking {
            id: self.allocate_id(),
            room_id: req.room_id,
            guest,
            check_in,
            check_out,
            status: initial_status,
        };
        self.bookings.insert(booking.id, booking.clone());

        if initial_status == BookingStatus::Confirmed {
            self.take_room(booking.room_id);
        }

        info!(
            booking_id = booking.id,
            room_id = booking.room_id,
            status = %booking.status,
            nights = booking.nights(),
            "Booking created"
        );
        Ok(booking)
    }

    /// Move a booking along its lifecycle, re-deriving room availability.
    pub fn transition_booking(&mut self, booking_id: u64, next: BookingStatus) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .get(&booking_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Booking, booking_id))?;
        let current = booking.status;
        let room_id = booking.room_id;

        if !current.can_transition_to(next) {
            return Err(CoreError::InvalidTransition { from: current, to: next });
        }

        if next == BookingStatus::Confirmed {
            let room = self
                .rooms
                .get(&room_id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Room, room_id))?;
            if !room.available {
                return Err(CoreError::RoomUnavailable(room_id));
            }
        }

        let booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Booking, booking_id))?;
        booking.status = next;
        let updated = booking.clone();

        if next == BookingStatus::Confirmed {
            self.take_room(room_id);
        } else if current.is_occupying() && !next.is_occupying() {
            self.release_room(room_id);
        }

        info!(booking_id, from = %current, to = %next, "Booking transitioned");
        Ok(updated)
    }

    pub fn get_hotel(&self, id: u64) -> CoreResult<Hotel> {
        self.hotels
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Hotel, id))
    }

    pub fn get_room(&self, id: u64) -> CoreResult<Room> {
        self.rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Room, id))
    }

    pub fn get_booking(&self, id: u64) -> CoreResult<Booking> {
        self.bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Booking, id))
    }

    pub fn list_hotels(&self) -> Vec<Hotel> {
        self.hotels.values().cloned().collect()
    }

    pub fn list_rooms(&self, hotel_id: Option<u64>) -> Vec<Room> {
        self.rooms
            .values()
            .filter(|room| hotel_id.map_or(true, |id| room.hotel_id == id))
            .cloned()
            .collect()
    }

    pub fn list_available_rooms(&self, hotel_id: Option<u64>) -> Vec<Room> {
        self.rooms
            .values()
            .filter(|room| room.available)
            .filter(|room| hotel_id.map_or(true, |id| room.hotel_id == id))
            .cloned()
            .collect()
    }

    pub fn list_bookings(&self) -> Vec<Booking> {
        self.bookings.values().cloned().collect()
    }

    pub fn filter_bookings_by_status(&self, status: BookingStatus) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|booking| booking.status == status)
            .cloned()
            .collect()
    }

    pub fn occupancy_summary(&self, hotel_id: Option<u64>) -> OccupancySummary {
        let rooms: Vec<&Room> = self
            .rooms
            .values()
            .filter(|room| hotel_id.map_or(true, |id| room.hotel_id == id))
            .collect();
        let bookings = self
            .bookings
            .values()
            .filter(|booking| rooms.iter().any(|room| room.id == booking.room_id));

        OccupancySummary::from_parts(rooms.iter().copied(), bookings)
    }

    fn room_has_occupant(&self, room_id: u64) -> bool {
        self.bookings
            .values()
            .any(|b| b.room_id == room_id && b.status.is_occupying())
    }

    fn take_room(&mut self, room_id: u64) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            if room.available {
                room.available = false;
                self.held_rooms.insert(room_id);
                debug!(room_id, "Room taken by booking");
            }
        }
    }

    /// Give the room back only if a booking took it and nothing occupies it now.
    fn release_room(&mut self, room_id: u64) {
        if !self.held_rooms.contains(&room_id) || self.room_has_occupant(room_id) {
            return;
        }
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.available = true;
            self.held_rooms.remove(&room_id);
            debug!(room_id, "Room released");
        }
    }
}

impl Default for BookingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn require_text(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewGuest, RoomType};

    fn hotel(engine: &mut BookingEngine, name: &str) -> Hotel {
        engine
            .create_hotel(NewHotel {
                name: name.to_string(),
                city: "Cartagena".to_string(),
                rating: Some(4.5),
            })
            .unwrap()
    }

    fn room(engine: &mut BookingEngine, hotel_id: u64, number: &str) -> Room {
        engine
            .create_room(NewRoom {
                hotel_id,
                number: number.to_string(),
                room_type: RoomType::Double,
                price_per_night: 220000.0,
                available: true,
            })
            .unwrap()
    }

    fn stay(room_id: u64, check_in: &str, check_out: &str) -> NewBooking {
        NewBooking {
            room_id,
            guest: NewGuest {
                name: "Ana Restrepo".to_string(),
                email: "ana@example.com".to_string(),
            },
            check_in: check_in.to_string(),
            check_out: check_out.to_string(),
        }
    }

    #[test]
    fn test_ids_strictly_increase_across_kinds() {
        let mut engine = BookingEngine::new();

        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");
        let b = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();
        let h2 = hotel(&mut engine, "Casa Verde");

        assert_eq!(h.id, 1);
        assert_eq!(r.id, 2);
        assert_eq!(b.guest.id, 3);
        assert_eq!(b.id, 4);
        assert_eq!(h2.id, 5);
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");

        let result = engine.create_booking(stay(r.id, "2025-03-10", "2025-03-05"), BookingStatus::Pending);
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(engine.list_bookings().is_empty());
    }

    #[test]
    fn test_unknown_room_rejected() {
        let mut engine = BookingEngine::new();

        let result = engine.create_booking(stay(99, "2025-03-05", "2025-03-10"), BookingStatus::Pending);
        assert!(matches!(
            result,
            Err(CoreError::NotFound { kind: EntityKind::Room, id: 99 })
        ));
    }

    #[test]
    fn test_failed_create_does_not_consume_ids() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");

        assert!(engine.create_booking(stay(r.id, "not-a-date", "2025-03-10"), BookingStatus::Pending).is_err());
        assert!(engine.create_booking(stay(404, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed).is_err());

        let b = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();
        assert_eq!(b.guest.id, 3);
        assert_eq!(b.id, 4);
        assert!(engine.get_room(r.id).unwrap().available);
    }

    #[test]
    fn test_confirmed_booking_takes_room() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let pending_room = room(&mut engine, h.id, "101");
        let confirmed_room = room(&mut engine, h.id, "102");

        engine
            .create_booking(stay(pending_room.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();
        engine
            .create_booking(stay(confirmed_room.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();

        assert!(engine.get_room(pending_room.id).unwrap().available);
        assert!(!engine.get_room(confirmed_room.id).unwrap().available);
    }

    #[test]
    fn test_other_statuses_leave_availability_alone() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");

        for status in [BookingStatus::CheckedIn, BookingStatus::CheckedOut, BookingStatus::Cancelled] {
            engine.create_booking(stay(r.id, "2025-03-05", "2025-03-10"), status).unwrap();
        }
        assert!(engine.get_room(r.id).unwrap().available);
    }

    #[test]
    fn test_available_rooms_filtered_by_hotel() {
        let mut engine = BookingEngine::new();
        let h1 = hotel(&mut engine, "Casa Azul");
        let h2 = hotel(&mut engine, "Casa Verde");
        let r1 = room(&mut engine, h1.id, "101");
        let r2 = room(&mut engine, h1.id, "102");
        let r3 = room(&mut engine, h2.id, "201");
        engine
            .create_booking(stay(r2.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();

        let ids: Vec<u64> = engine.list_available_rooms(Some(h1.id)).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![r1.id]);

        let all: Vec<u64> = engine.list_available_rooms(None).iter().map(|r| r.id).collect();
        assert_eq!(all, vec![r1.id, r3.id]);

        assert_eq!(engine.list_rooms(Some(h1.id)).len(), 2);
    }

    #[test]
    fn test_filter_by_status_exact() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");

        let c1 = engine
            .create_booking(stay(r.id, "2025-03-01", "2025-03-02"), BookingStatus::Cancelled)
            .unwrap();
        engine
            .create_booking(stay(r.id, "2025-03-02", "2025-03-03"), BookingStatus::Pending)
            .unwrap();
        let c2 = engine
            .create_booking(stay(r.id, "2025-03-03", "2025-03-04"), BookingStatus::Cancelled)
            .unwrap();

        let cancelled = engine.filter_bookings_by_status(BookingStatus::Cancelled);
        assert_eq!(cancelled, vec![c1, c2]);
        assert!(engine.filter_bookings_by_status(BookingStatus::CheckedOut).is_empty());
    }

    #[test]
    fn test_listings_are_snapshots() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        room(&mut engine, h.id, "101");

        let mut hotels = engine.list_hotels();
        hotels.clear();
        let mut rooms = engine.list_available_rooms(None);
        rooms[0].available = false;
        rooms.push(rooms[0].clone());

        assert_eq!(engine.list_hotels().len(), 1);
        let rooms = engine.list_available_rooms(None);
        assert_eq!(rooms.len(), 1);
        assert!(rooms[0].available);
    }

    #[test]
    fn test_room_requires_known_hotel() {
        let mut engine = BookingEngine::new();
        let result = engine.create_room(NewRoom {
            hotel_id: 7,
            number: "101".to_string(),
            room_type: RoomType::Single,
            price_per_night: 110000.0,
            available: true,
        });
        assert!(matches!(
            result,
            Err(CoreError::NotFound { kind: EntityKind::Hotel, id: 7 })
        ));

        let mut permissive = BookingEngine::with_settings(EngineSettings { require_known_hotel: false });
        assert!(room_for_missing_hotel(&mut permissive).is_ok());
    }

    fn room_for_missing_hotel(engine: &mut BookingEngine) -> CoreResult<Room> {
        engine.create_room(NewRoom {
            hotel_id: 7,
            number: "101".to_string(),
            room_type: RoomType::Single,
            price_per_night: 110000.0,
            available: true,
        })
    }

    #[test]
    fn test_field_validation() {
        let mut engine = BookingEngine::new();

        let bad_rating = engine.create_hotel(NewHotel {
            name: "Casa Azul".to_string(),
            city: "Cartagena".to_string(),
            rating: Some(5.5),
        });
        assert!(matches!(bad_rating, Err(CoreError::Validation(_))));

        let blank_city = engine.create_hotel(NewHotel {
            name: "Casa Azul".to_string(),
            city: "  ".to_string(),
            rating: None,
        });
        assert!(matches!(blank_city, Err(CoreError::Validation(_))));

        let h = hotel(&mut engine, "Casa Azul");
        let negative = engine.create_room(NewRoom {
            hotel_id: h.id,
            number: "101".to_string(),
            room_type: RoomType::Family,
            price_per_night: -1.0,
            available: true,
        });
        assert!(matches!(negative, Err(CoreError::Validation(_))));

        let r = room(&mut engine, h.id, "101");
        let mut req = stay(r.id, "2025-03-05", "2025-03-10");
        req.guest.email = "ana.example.com".to_string();
        assert!(matches!(
            engine.create_booking(req, BookingStatus::Pending),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_booking_lifecycle_releases_room() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");
        let b = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();

        // pending → confirmed
        engine.transition_booking(b.id, BookingStatus::Confirmed).unwrap();
        assert!(!engine.get_room(r.id).unwrap().available);

        // confirmed → checked-in
        engine.transition_booking(b.id, BookingStatus::CheckedIn).unwrap();
        assert!(!engine.get_room(r.id).unwrap().available);

        // checked-in → checked-out
        let done = engine.transition_booking(b.id, BookingStatus::CheckedOut).unwrap();
        assert_eq!(done.status, BookingStatus::CheckedOut);
        assert!(engine.get_room(r.id).unwrap().available);

        let again = engine.transition_booking(b.id, BookingStatus::Cancelled);
        assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn test_confirm_requires_available_room() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");
        engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();
        let waiting = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();

        let result = engine.transition_booking(waiting.id, BookingStatus::Confirmed);
        assert!(matches!(result, Err(CoreError::RoomUnavailable(id)) if id == r.id));
        assert_eq!(engine.get_booking(waiting.id).unwrap().status, BookingStatus::Pending);
    }

    #[test]
    fn test_cancel_keeps_room_while_other_occupant_remains() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");
        let first = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();
        let second = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();

        engine.transition_booking(first.id, BookingStatus::Cancelled).unwrap();
        assert!(!engine.get_room(r.id).unwrap().available);

        engine.transition_booking(second.id, BookingStatus::Cancelled).unwrap();
        assert!(engine.get_room(r.id).unwrap().available);
    }

    #[test]
    fn test_cancel_pending_does_not_touch_room() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = engine
            .create_room(NewRoom {
                hotel_id: h.id,
                number: "301".to_string(),
                room_type: RoomType::Suite,
                price_per_night: 520000.0,
                available: false,
            })
            .unwrap();
        let b = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Pending)
            .unwrap();

        engine.transition_booking(b.id, BookingStatus::Cancelled).unwrap();
        assert!(!engine.get_room(r.id).unwrap().available);

        let missing = engine.transition_booking(999, BookingStatus::Cancelled);
        assert!(matches!(missing, Err(CoreError::NotFound { kind: EntityKind::Booking, .. })));
    }

    #[test]
    fn test_cancel_never_frees_room_created_unavailable() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = engine
            .create_room(NewRoom {
                hotel_id: h.id,
                number: "201".to_string(),
                room_type: RoomType::Suite,
                price_per_night: 850000.0,
                available: false,
            })
            .unwrap();

        let b = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();
        engine.transition_booking(b.id, BookingStatus::Cancelled).unwrap();

        assert!(!engine.get_room(r.id).unwrap().available);
        assert!(engine.list_available_rooms(Some(h.id)).is_empty());
    }

    #[test]
    fn test_room_released_after_last_holder_leaves() {
        let mut engine = BookingEngine::new();
        let h = hotel(&mut engine, "Casa Azul");
        let r = room(&mut engine, h.id, "101");
        let first = engine
            .create_booking(stay(r.id, "2025-03-05", "2025-03-10"), BookingStatus::Confirmed)
            .unwrap();
        // Created on an already taken room, so it shares the hold
        let second = engine
            .create_booking(stay(r.id, "2025-03-10", "2025-03-12"), BookingStatus::Confirmed)
            .unwrap();

        engine.transition_booking(second.id, BookingStatus::Cancelled).unwrap();
        assert!(!engine.get_room(r.id).unwrap().available);

        engine.transition_booking(first.id, BookingStatus::CheckedIn).unwrap();
        engine.transition_booking(first.id, BookingStatus::CheckedOut).unwrap();
        assert!(engine.get_room(r.id).unwrap().available);
    }
}
