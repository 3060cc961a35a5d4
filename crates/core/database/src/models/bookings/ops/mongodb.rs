use ::mongodb::bson::doc;
use ::mongodb::options::FindOptions;
use evently_result::Result;

use crate::{is_duplicate_key, MongoDb};
use crate::{Booking, PartialBooking};

use super::AbstractBookings;

static COL: &str = "bookings";
static BOOKING_INDEX: &str = "event_id_email";

fn already_booked() -> evently_result::Error {
    create_error!(UniquenessViolation {
        collection: COL.to_string(),
        field: "event_id, email".to_string()
    })
}

#[async_trait]
impl AbstractBookings for MongoDb {
    /// Insert a new booking into the database
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.insert_one(COL, booking)
            .await
            .map(|_| ())
            .map_err(|error| {
                if is_duplicate_key(&error, BOOKING_INDEX) {
                    already_booked()
                } else {
                    create_database_error!("insert_one", COL)
                }
            })
    }

    /// Fetch a booking by its id
    async fn fetch_booking(&self, id: &str) -> Result<Booking> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all bookings for an event
    async fn fetch_bookings_by_event(&self, event_id: &str) -> Result<Vec<Booking>> {
        query!(
            self,
            find_with_options,
            COL,
            doc! {
                "event_id": event_id
            },
            FindOptions::builder()
                .sort(doc! {
                    "created_at": 1_i32
                })
                .build()
        )
    }

    /// Count the bookings for an event
    async fn count_bookings_by_event(&self, event_id: &str) -> Result<usize> {
        query!(
            self,
            count_documents,
            COL,
            doc! {
                "event_id": event_id
            }
        )
        .map(|count| count as usize)
    }

    /// Update a booking with a normalised change-set
    async fn update_booking(&self, id: &str, partial: &PartialBooking) -> Result<()> {
        let result = self
            .update_one_by_id(COL, id, partial)
            .await
            .map_err(|error| {
                if is_duplicate_key(&error, BOOKING_INDEX) {
                    already_booked()
                } else {
                    create_database_error!("update_one", COL)
                }
            })?;

        if result.matched_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
