use evently_result::Result;

use crate::{Event, PartialEvent};

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractEvents: Sync + Send {
    /// Insert a new event into the database
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Fetch an event by its id
    async fn fetch_event(&self, id: &str) -> Result<Event>;

    /// Fetch an event by its slug
    async fn fetch_event_by_slug(&self, slug: &str) -> Result<Event>;

    /// Fetch all events, newest first
    async fn fetch_events(&self) -> Result<Vec<Event>>;

    /// Fetch events sharing at least one tag with the given event, newest first
    async fn fetch_similar_events(&self, slug: &str) -> Result<Vec<Event>>;

    /// Check whether an event with the given id exists
    async fn event_exists(&self, id: &str) -> Result<bool>;

    /// Update an event with a normalised change-set
    async fn update_event(&self, id: &str, partial: &PartialEvent) -> Result<()>;
}
