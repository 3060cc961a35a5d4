use std::str::FromStr;

use evently_result::{Error, Result};
use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::util::normalise::{
    normalise_date, normalise_list, normalise_set, normalise_time, slugify,
};
use crate::Database;

auto_derived!(
    /// How attendees take part in an event
    #[serde(rename_all = "lowercase")]
    pub enum EventMode {
        Online,
        Offline,
        Hybrid,
    }
);

impl FromStr for EventMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "online" => Ok(EventMode::Online),
            "offline" => Ok(EventMode::Offline),
            "hybrid" => Ok(EventMode::Hybrid),
            _ => Err(create_error!(InvalidEnumValue {
                field: "mode".to_string(),
                value: value.to_string()
            })),
        }
    }
}

impl std::fmt::Display for EventMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventMode::Online => write!(f, "online"),
            EventMode::Offline => write!(f, "offline"),
            EventMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

auto_derived_partial!(
    /// Event
    pub struct Event {
        /// Event Id
        #[serde(rename = "_id")]
        pub id: String,

        /// Event title
        pub title: String,
        /// URL-safe identifier derived from the title
        pub slug: String,
        /// Full description
        pub description: String,
        /// Short overview shown on event cards
        pub overview: String,
        /// Cover image URL or path
        pub image: String,
        /// Venue name
        pub venue: String,
        /// Location of the venue
        pub location: String,
        /// Calendar date as `YYYY-MM-DD`
        pub date: String,
        /// Start time as 24-hour `HH:MM`
        pub time: String,
        /// Attendance mode
        pub mode: EventMode,
        /// Intended audience
        pub audience: String,
        /// Ordered agenda items
        pub agenda: Vec<String>,
        /// Organizer name
        pub organizer: String,
        /// Tags, without duplicates
        pub tags: Vec<String>,

        /// Time at which this event was created
        pub created_at: Timestamp,
        /// Time at which this event was last written
        pub updated_at: Timestamp,
    },
    "PartialEvent"
);

auto_derived!(
    /// Candidate event submitted for creation
    #[derive(Default)]
    pub struct DataCreateEvent {
        pub title: Option<String>,
        pub description: Option<String>,
        pub overview: Option<String>,
        pub image: Option<String>,
        pub venue: Option<String>,
        pub location: Option<String>,
        pub date: Option<String>,
        pub time: Option<String>,
        pub mode: Option<String>,
        pub audience: Option<String>,
        pub agenda: Option<Vec<String>>,
        pub organizer: Option<String>,
        pub tags: Option<Vec<String>>,
    }

    /// Changes submitted for an existing event
    #[derive(Default)]
    pub struct DataEditEvent {
        pub title: Option<String>,
        pub description: Option<String>,
        pub overview: Option<String>,
        pub image: Option<String>,
        pub venue: Option<String>,
        pub location: Option<String>,
        pub date: Option<String>,
        pub time: Option<String>,
        pub mode: Option<String>,
        pub audience: Option<String>,
        pub agenda: Option<Vec<String>>,
        pub organizer: Option<String>,
        pub tags: Option<Vec<String>>,
    }
);

impl TryFrom<DataEditEvent> for PartialEvent {
    type Error = Error;

    fn try_from(data: DataEditEvent) -> Result<Self> {
        Ok(PartialEvent {
            id: None,
            title: data.title,
            slug: None,
            description: data.description,
            overview: data.overview,
            image: data.image,
            venue: data.venue,
            location: data.location,
            date: data.date,
            time: data.time,
            mode: data.mode.as_deref().map(EventMode::from_str).transpose()?,
            audience: data.audience,
            agenda: data.agenda,
            organizer: data.organizer,
            tags: data.tags,
            created_at: None,
            updated_at: None,
        })
    }
}

impl TryFrom<DataCreateEvent> for PartialEvent {
    type Error = Error;

    fn try_from(data: DataCreateEvent) -> Result<Self> {
        PartialEvent::try_from(DataEditEvent {
            title: data.title,
            description: data.description,
            overview: data.overview,
            image: data.image,
            venue: data.venue,
            location: data.location,
            date: data.date,
            time: data.time,
            mode: data.mode,
            audience: data.audience,
            agenda: data.agenda,
            organizer: data.organizer,
            tags: data.tags,
        })
    }
}

fn missing(field: &str) -> Error {
    create_error!(MissingRequiredField {
        field: field.to_string()
    })
}

impl TryFrom<PartialEvent> for Event {
    type Error = Error;

    /// Build a complete document, every field must be present
    fn try_from(partial: PartialEvent) -> Result<Self> {
        Ok(Event {
            id: partial.id.ok_or_else(|| missing("_id"))?,
            title: partial.title.ok_or_else(|| missing("title"))?,
            slug: partial.slug.ok_or_else(|| missing("slug"))?,
            description: partial.description.ok_or_else(|| missing("description"))?,
            overview: partial.overview.ok_or_else(|| missing("overview"))?,
            image: partial.image.ok_or_else(|| missing("image"))?,
            venue: partial.venue.ok_or_else(|| missing("venue"))?,
            location: partial.location.ok_or_else(|| missing("location"))?,
            date: partial.date.ok_or_else(|| missing("date"))?,
            time: partial.time.ok_or_else(|| missing("time"))?,
            mode: partial.mode.ok_or_else(|| missing("mode"))?,
            audience: partial.audience.ok_or_else(|| missing("audience"))?,
            agenda: partial.agenda.ok_or_else(|| missing("agenda"))?,
            organizer: partial.organizer.ok_or_else(|| missing("organizer"))?,
            tags: partial.tags.ok_or_else(|| missing("tags"))?,
            created_at: partial.created_at.ok_or_else(|| missing("created_at"))?,
            updated_at: partial.updated_at.ok_or_else(|| missing("updated_at"))?,
        })
    }
}

impl Event {
    /// Create a new event
    pub async fn create(db: &Database, data: DataCreateEvent) -> Result<Event> {
        let now = Timestamp::now_utc();
        let mut partial = PartialEvent::try_from(data)?;
        partial.id = Some(Ulid::new().to_string());
        partial.created_at = Some(now);
        partial.updated_at = Some(now);

        let (event, _) = Event::validate_and_normalise(None, partial)?;
        db.insert_event(&event).await?;

        info!("Created event {} ({}).", event.id, event.slug);
        Ok(event)
    }

    /// Update this event
    pub async fn update(&mut self, db: &Database, mut partial: PartialEvent) -> Result<()> {
        partial.id = None;
        partial.created_at = None;
        partial.updated_at = Some(Timestamp::now_utc());

        let (event, partial) = Event::validate_and_normalise(Some(&*self), partial)?;
        db.update_event(&self.id, &partial).await?;

        debug!("Updated event {}.", self.id);
        *self = event;
        Ok(())
    }

    /// Validate a change-set against the current document, if there is one
    ///
    /// Only fields present in the change-set are normalised, while the static
    /// constraints are checked against the whole resulting document. Returns the
    /// resulting document along with the normalised change-set to persist.
    pub fn validate_and_normalise(
        current: Option<&Event>,
        changes: PartialEvent,
    ) -> Result<(Event, PartialEvent)> {
        let changes = Event::normalise(changes)?;

        let event = match current {
            Some(current) => {
                let mut event = current.clone();
                event.apply_options(changes.clone());
                event
            }
            None => Event::try_from(changes.clone())?,
        };

        event.validate()?;
        Ok((event, changes))
    }

    /// Normalise the fields present in a change-set
    ///
    /// The slug is never taken from the caller, it follows the title.
    pub fn normalise(mut changes: PartialEvent) -> Result<PartialEvent> {
        for field in [
            &mut changes.title,
            &mut changes.description,
            &mut changes.overview,
            &mut changes.image,
            &mut changes.venue,
            &mut changes.location,
            &mut changes.audience,
            &mut changes.organizer,
        ]
        .into_iter()
        .flatten()
        {
            *field = field.trim().to_string();
        }

        changes.slug = changes.title.as_deref().map(slugify);
        changes.date = changes
            .date
            .map(|date| normalise_date("date", &date))
            .transpose()?;
        changes.time = changes
            .time
            .map(|time| normalise_time("time", &time))
            .transpose()?;
        changes.agenda = changes.agenda.map(normalise_list);
        changes.tags = changes.tags.map(normalise_set);

        Ok(changes)
    }

    /// Check the static constraints of a complete document
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("slug", &self.slug),
            ("description", &self.description),
            ("overview", &self.overview),
            ("image", &self.image),
            ("venue", &self.venue),
            ("location", &self.location),
            ("date", &self.date),
            ("time", &self.time),
            ("audience", &self.audience),
            ("organizer", &self.organizer),
        ] {
            if value.trim().is_empty() {
                return Err(missing(field));
            }
        }

        for (field, value) in [("agenda", &self.agenda), ("tags", &self.tags)] {
            if value.is_empty() {
                return Err(create_error!(EmptyCollectionField {
                    field: field.to_string()
                }));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use evently_result::ErrorType;

    use crate::util::test_fixtures::event_candidate as sample;
    use crate::{DataEditEvent, Event, EventMode, PartialEvent};

    #[test]
    fn mode_parsing() {
        assert_eq!("online".parse::<EventMode>().unwrap(), EventMode::Online);
        assert_eq!(" Hybrid ".parse::<EventMode>().unwrap(), EventMode::Hybrid);
        assert_eq!(
            "in-person".parse::<EventMode>().unwrap_err().error_type,
            ErrorType::InvalidEnumValue {
                field: "mode".to_string(),
                value: "in-person".to_string()
            }
        );
        assert_eq!(
            serde_json::to_value(EventMode::Offline).unwrap(),
            serde_json::json!("offline")
        );
    }

    #[tokio::test]
    async fn create_normalises_fields() {
        database_test!(|db| async move {
            let mut data = sample("My Cool Event!!");
            data.tags = Some(vec!["rust".into(), " rust ".into(), "web".into()]);

            let event = Event::create(&db, data).await.unwrap();
            assert_eq!(event.slug, "my-cool-event");
            assert_eq!(event.date, "2025-03-05");
            assert_eq!(event.time, "09:05");
            assert_eq!(event.mode, EventMode::Hybrid);
            assert_eq!(event.tags, vec!["rust".to_string(), "web".to_string()]);

            let fetched = db.fetch_event(&event.id).await.unwrap();
            assert_eq!(fetched, event);
            assert_eq!(db.fetch_event_by_slug("my-cool-event").await.unwrap(), event);
        });
    }

    #[tokio::test]
    async fn create_rejects_invalid_candidates() {
        database_test!(|db| async move {
            let mut data = sample("Missing venue");
            data.venue = None;
            assert_eq!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::MissingRequiredField {
                    field: "venue".to_string()
                }
            );

            let mut data = sample("Blank organizer");
            data.organizer = Some("   ".to_string());
            assert_eq!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::MissingRequiredField {
                    field: "organizer".to_string()
                }
            );

            let mut data = sample("Bad mode");
            data.mode = Some("telepathic".to_string());
            assert!(matches!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::InvalidEnumValue { .. }
            ));

            let mut data = sample("Bad date");
            data.date = Some("someday".to_string());
            assert!(matches!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::InvalidDateFormat { field, .. } if field == "date"
            ));

            let mut data = sample("Bad time");
            data.time = Some("half past nine".to_string());
            assert!(matches!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::InvalidTimeFormat { field, .. } if field == "time"
            ));

            let mut data = sample("No agenda");
            data.agenda = Some(vec!["  ".to_string()]);
            assert_eq!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::EmptyCollectionField {
                    field: "agenda".to_string()
                }
            );

            let mut data = sample("No tags");
            data.tags = Some(vec![]);
            assert_eq!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::EmptyCollectionField {
                    field: "tags".to_string()
                }
            );

            let data = sample("!!!");
            assert_eq!(
                Event::create(&db, data).await.unwrap_err().error_type,
                ErrorType::MissingRequiredField {
                    field: "slug".to_string()
                }
            );

            assert!(db.fetch_events().await.unwrap().is_empty());
        });
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        database_test!(|db| async move {
            let first = Event::create(&db, sample("Launch Day")).await.unwrap();
            let error = Event::create(&db, sample("Launch Day")).await.unwrap_err();
            assert_eq!(
                error.error_type,
                ErrorType::UniquenessViolation {
                    collection: "events".to_string(),
                    field: "slug".to_string()
                }
            );

            let error = Event::create(&db, sample("launch   day!")).await.unwrap_err();
            assert!(matches!(
                error.error_type,
                ErrorType::UniquenessViolation { .. }
            ));

            let events = db.fetch_events().await.unwrap();
            assert_eq!(events, vec![first]);
        });
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_slug() {
        database_test!(|db| async move {
            let (a, b) = futures::join!(
                Event::create(&db, sample("Launch Day")),
                Event::create(&db, sample("Launch Day"))
            );

            let (created, error) = match (a, b) {
                (Ok(event), Err(error)) | (Err(error), Ok(event)) => (event, error),
                (a, b) => panic!("expected exactly one insert to win: {a:?} / {b:?}"),
            };

            assert_eq!(
                error.error_type,
                ErrorType::UniquenessViolation {
                    collection: "events".to_string(),
                    field: "slug".to_string()
                }
            );
            assert_eq!(db.fetch_events().await.unwrap(), vec![created]);
        });
    }

    #[tokio::test]
    async fn update_only_normalises_changed_fields() {
        database_test!(|db| async move {
            let mut event = Event::create(&db, sample("Rust Meetup")).await.unwrap();
            let original = event.clone();

            event
                .update(
                    &db,
                    PartialEvent {
                        venue: Some("  Town Hall ".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            assert_eq!(event.venue, "Town Hall");
            assert_eq!(event.slug, original.slug);
            assert_eq!(event.date, original.date);
            assert_eq!(event.time, original.time);
            assert_eq!(event.created_at, original.created_at);

            let changes = PartialEvent::try_from(DataEditEvent {
                title: Some("Rust Meetup: Winter Edition".to_string()),
                date: Some("Dec 1st, 2025".to_string()),
                time: Some("2:30 PM".to_string()),
                mode: Some("online".to_string()),
                ..Default::default()
            })
            .unwrap();

            event.update(&db, changes).await.unwrap();
            assert_eq!(event.slug, "rust-meetup-winter-edition");
            assert_eq!(event.date, "2025-12-01");
            assert_eq!(event.time, "14:30");
            assert_eq!(event.mode, EventMode::Online);

            assert_eq!(db.fetch_event(&event.id).await.unwrap(), event);
        });
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        database_test!(|db| async move {
            let mut event = Event::create(&db, sample("Atomic Event")).await.unwrap();
            let original = event.clone();

            let error = event
                .update(
                    &db,
                    PartialEvent {
                        venue: Some("New Venue".to_string()),
                        time: Some("99:99".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();

            assert!(matches!(error.error_type, ErrorType::InvalidTimeFormat { .. }));
            assert_eq!(event, original);
            assert_eq!(db.fetch_event(&event.id).await.unwrap(), original);
        });
    }

    #[tokio::test]
    async fn renaming_onto_existing_slug_is_rejected() {
        database_test!(|db| async move {
            Event::create(&db, sample("Launch Day")).await.unwrap();
            let mut other = Event::create(&db, sample("Other Day")).await.unwrap();
            let original = other.clone();

            let error = other
                .update(
                    &db,
                    PartialEvent {
                        title: Some("Launch Day".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();

            assert!(matches!(
                error.error_type,
                ErrorType::UniquenessViolation { .. }
            ));
            assert_eq!(other, original);
        });
    }

    #[tokio::test]
    async fn similar_events_share_a_tag() {
        database_test!(|db| async move {
            let mut data = sample("Rust Conf");
            data.tags = Some(vec!["rust".to_string(), "systems".to_string()]);
            let rust = Event::create(&db, data).await.unwrap();

            let mut data = sample("Systems Night");
            data.tags = Some(vec!["systems".to_string()]);
            let systems = Event::create(&db, data).await.unwrap();

            let mut data = sample("Design Day");
            data.tags = Some(vec!["design".to_string()]);
            let design = Event::create(&db, data).await.unwrap();

            let similar = db.fetch_similar_events(&rust.slug).await.unwrap();
            assert_eq!(similar, vec![systems]);

            assert!(db
                .fetch_similar_events(&design.slug)
                .await
                .unwrap()
                .is_empty());

            assert!(matches!(
                db.fetch_similar_events("no-such-event")
                    .await
                    .unwrap_err()
                    .error_type,
                ErrorType::NotFound
            ));

            assert_eq!(db.fetch_events().await.unwrap().len(), 3);
            assert!(db.event_exists(&rust.id).await.unwrap());
            assert!(!db.event_exists("no-such-id").await.unwrap());
        });
    }

    #[test]
    fn static_constraints_revalidated_on_unrelated_change() {
        let mut data = sample("Stored Event");
        data.date = Some("2025-03-05".to_string());
        let mut partial = PartialEvent::try_from(data).unwrap();
        partial.id = Some("id".to_string());
        partial.created_at = Some(iso8601_timestamp::Timestamp::now_utc());
        partial.updated_at = partial.created_at;

        let (mut current, _) = Event::validate_and_normalise(None, partial).unwrap();

        // A document stored before the constraint existed
        current.tags.clear();

        let error = Event::validate_and_normalise(
            Some(&current),
            PartialEvent {
                venue: Some("Elsewhere".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(
            error.error_type,
            ErrorType::EmptyCollectionField {
                field: "tags".to_string()
            }
        );
    }

    #[test]
    fn caller_supplied_slug_is_ignored() {
        let changes = Event::normalise(PartialEvent {
            slug: Some("Not A Slug".to_string()),
            venue: Some("Hall".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(changes.slug, None);
        assert_eq!(changes.title, None);
    }
}
