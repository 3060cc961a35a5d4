use ::mongodb::bson::doc;
use ::mongodb::options::FindOptions;
use evently_result::Result;

use crate::{is_duplicate_key, MongoDb};
use crate::{Event, PartialEvent};

use super::AbstractEvents;

static COL: &str = "events";
static SLUG_INDEX: &str = "slug";

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! {
            "created_at": -1_i32
        })
        .build()
}

fn slug_taken() -> evently_result::Error {
    create_error!(UniquenessViolation {
        collection: COL.to_string(),
        field: "slug".to_string()
    })
}

#[async_trait]
impl AbstractEvents for MongoDb {
    /// Insert a new event into the database
    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.insert_one(COL, event)
            .await
            .map(|_| ())
            .map_err(|error| {
                if is_duplicate_key(&error, SLUG_INDEX) {
                    slug_taken()
                } else {
                    create_database_error!("insert_one", COL)
                }
            })
    }

    /// Fetch an event by its id
    async fn fetch_event(&self, id: &str) -> Result<Event> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch an event by its slug
    async fn fetch_event_by_slug(&self, slug: &str) -> Result<Event> {
        query!(
            self,
            find_one,
            COL,
            doc! {
                "slug": slug
            }
        )?
        .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all events, newest first
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        query!(self, find_with_options, COL, doc! {}, newest_first())
    }

    /// Fetch events sharing at least one tag with the given event, newest first
    async fn fetch_similar_events(&self, slug: &str) -> Result<Vec<Event>> {
        let event = self.fetch_event_by_slug(slug).await?;
        query!(
            self,
            find_with_options,
            COL,
            doc! {
                "_id": {
                    "$ne": &event.id
                },
                "tags": {
                    "$in": event.tags.clone()
                }
            },
            newest_first()
        )
    }

    /// Check whether an event with the given id exists
    async fn event_exists(&self, id: &str) -> Result<bool> {
        query!(
            self,
            exists,
            COL,
            doc! {
                "_id": id
            }
        )
    }

    /// Update an event with a normalised change-set
    async fn update_event(&self, id: &str, partial: &PartialEvent) -> Result<()> {
        let result = self
            .update_one_by_id(COL, id, partial)
            .await
            .map_err(|error| {
                if is_duplicate_key(&error, SLUG_INDEX) {
                    slug_taken()
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
