use evently_result::Result;

use crate::ReferenceDb;
use crate::{Booking, PartialBooking};

use super::AbstractBookings;

fn already_booked() -> evently_result::Error {
    create_error!(UniquenessViolation {
        collection: "bookings".to_string(),
        field: "event_id, email".to_string()
    })
}

#[async_trait]
impl AbstractBookings for ReferenceDb {
    /// Insert a new booking into the database
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let mut bookings = self.bookings.lock().await;
        if bookings.contains_key(&booking.id) {
            Err(create_database_error!("insert", "booking"))
        } else if bookings
            .values()
            .any(|other| other.event_id == booking.event_id && other.email == booking.email)
        {
            Err(already_booked())
        } else {
            bookings.insert(booking.id.to_string(), booking.clone());
            Ok(())
        }
    }

    /// Fetch a booking by its id
    async fn fetch_booking(&self, id: &str) -> Result<Booking> {
        let bookings = self.bookings.lock().await;
        bookings
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all bookings for an event
    async fn fetch_bookings_by_event(&self, event_id: &str) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        let mut bookings: Vec<Booking> = bookings
            .values()
            .filter(|booking| booking.event_id == event_id)
            .cloned()
            .collect();

        bookings.sort_by_key(|booking| (booking.created_at, booking.id.clone()));
        Ok(bookings)
    }

    /// Count the bookings for an event
    async fn count_bookings_by_event(&self, event_id: &str) -> Result<usize> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .values()
            .filter(|booking| booking.event_id == event_id)
            .count())
    }

    /// Update a booking with a normalised change-set
    async fn update_booking(&self, id: &str, partial: &PartialBooking) -> Result<()> {
        let mut bookings = self.bookings.lock().await;
        let mut updated = bookings
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))?;

        updated.apply_options(partial.clone());

        if bookings.values().any(|other| {
            other.id != id && other.event_id == updated.event_id && other.email == updated.email
        }) {
            return Err(already_booked());
        }

        bookings.insert(id.to_string(), updated);
        Ok(())
    }
}
