use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Booking, BookingStatus, Room};

/// Occupancy figures for a set of rooms and the bookings that reference them
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySummary {
    pub total_rooms: usize,
    pub available_rooms: usize,
    pub occupied_rooms: usize,
    /// Share of available rooms, rounded to a whole percent
    pub availability_percentage: u32,
    pub bookings_by_status: BTreeMap<String, usize>,
}

impl OccupancySummary {
    pub fn from_parts<'a>(
        rooms: impl IntoIterator<Item = &'a Room>,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> Self {
        let (total_rooms, available_rooms) = rooms
            .into_iter()
            .fold((0usize, 0usize), |(total, available), room| {
                (total + 1, available + usize::from(room.available))
            });

        let mut bookings_by_status: BTreeMap<String, usize> = BookingStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), 0))
            .collect();
        for booking in bookings {
            *bookings_by_status
                .entry(booking.status.as_str().to_string())
                .or_default() += 1;
        }

        let availability_percentage = if total_rooms == 0 {
            0
        } else {
            (available_rooms as f64 / total_rooms as f64 * 100.0).round() as u32
        };

        Self {
            total_rooms,
            available_rooms,
            occupied_rooms: total_rooms - available_rooms,
            availability_percentage,
            bookings_by_status,
        }
    }
}
