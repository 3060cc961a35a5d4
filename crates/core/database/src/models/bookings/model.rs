use evently_result::{Error, Result};
use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::util::normalise::normalise_email;
use crate::Database;

auto_derived_partial!(
    /// Booking
    pub struct Booking {
        /// Booking Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Id of the booked event
        pub event_id: String,
        /// Attendee email, trimmed and lowercased
        pub email: String,

        /// Time at which this booking was created
        pub created_at: Timestamp,
        /// Time at which this booking was last written
        pub updated_at: Timestamp,
    },
    "PartialBooking"
);

auto_derived!(
    /// Candidate booking submitted for creation
    #[derive(Default)]
    pub struct DataCreateBooking {
        pub event_id: Option<String>,
        pub email: Option<String>,
    }
);

fn missing(field: &str) -> Error {
    create_error!(MissingRequiredField {
        field: field.to_string()
    })
}

impl TryFrom<PartialBooking> for Booking {
    type Error = Error;

    /// Build a complete document, every field must be present
    fn try_from(partial: PartialBooking) -> Result<Self> {
        Ok(Booking {
            id: partial.id.ok_or_else(|| missing("_id"))?,
            event_id: partial.event_id.ok_or_else(|| missing("event_id"))?,
            email: partial.email.ok_or_else(|| missing("email"))?,
            created_at: partial.created_at.ok_or_else(|| missing("created_at"))?,
            updated_at: partial.updated_at.ok_or_else(|| missing("updated_at"))?,
        })
    }
}

impl Booking {
    /// Create a new booking
    pub async fn create(db: &Database, data: DataCreateBooking) -> Result<Booking> {
        let now = Timestamp::now_utc();
        let partial = PartialBooking {
            id: Some(Ulid::new().to_string()),
            event_id: data.event_id,
            email: data.email,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let (booking, _) = Booking::validate_and_normalise(db, None, partial).await?;
        db.insert_booking(&booking).await?;

        info!("Booked event {} as {}.", booking.event_id, booking.id);
        Ok(booking)
    }

    /// Update this booking
    pub async fn update(&mut self, db: &Database, mut partial: PartialBooking) -> Result<()> {
        partial.id = None;
        partial.created_at = None;
        partial.updated_at = Some(Timestamp::now_utc());

        let (booking, partial) =
            Booking::validate_and_normalise(db, Some(&*self), partial).await?;
        db.update_booking(&self.id, &partial).await?;

        debug!("Updated booking {}.", self.id);
        *self = booking;
        Ok(())
    }

    /// Validate a change-set against the current document, if there is one
    ///
    /// A new or changed event reference must point at an existing event.
    pub async fn validate_and_normalise(
        db: &Database,
        current: Option<&Booking>,
        mut changes: PartialBooking,
    ) -> Result<(Booking, PartialBooking)> {
        changes.event_id = changes.event_id.map(|id| id.trim().to_string());
        changes.email = changes
            .email
            .map(|email| normalise_email(&email))
            .transpose()?;

        let booking = match current {
            Some(current) => {
                let mut booking = current.clone();
                booking.apply_options(changes.clone());
                booking
            }
            None => Booking::try_from(changes.clone())?,
        };

        booking.validate()?;

        if let Some(event_id) = &changes.event_id {
            if !db.event_exists(event_id).await? {
                return Err(create_error!(ReferentialIntegrityError {
                    event_id: event_id.to_string()
                }));
            }
        }

        Ok((booking, changes))
    }

    /// Check the static constraints of a complete document
    pub fn validate(&self) -> Result<()> {
        if self.event_id.is_empty() {
            return Err(missing("event_id"));
        }

        normalise_email(&self.email).map(|_| ())
    }
}
