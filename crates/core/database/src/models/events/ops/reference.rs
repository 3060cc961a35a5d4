use std::cmp::Reverse;

use evently_result::Result;

use crate::ReferenceDb;
use crate::{Event, PartialEvent};

use super::AbstractEvents;

fn newest_first(events: &mut [Event]) {
    events.sort_by_key(|event| Reverse((event.created_at, event.id.clone())));
}

#[async_trait]
impl AbstractEvents for ReferenceDb {
    /// Insert a new event into the database
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().await;
        if events.contains_key(&event.id) {
            Err(create_database_error!("insert", "event"))
        } else if events.values().any(|other| other.slug == event.slug) {
            Err(create_error!(UniquenessViolation {
                collection: "events".to_string(),
                field: "slug".to_string()
            }))
        } else {
            events.insert(event.id.to_string(), event.clone());
            Ok(())
        }
    }

    /// Fetch an event by its id
    async fn fetch_event(&self, id: &str) -> Result<Event> {
        let events = self.events.lock().await;
        events.get(id).cloned().ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch an event by its slug
    async fn fetch_event_by_slug(&self, slug: &str) -> Result<Event> {
        let events = self.events.lock().await;
        events
            .values()
            .find(|event| event.slug == slug)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all events, newest first
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        let events = self.events.lock().await;
        let mut events: Vec<Event> = events.values().cloned().collect();
        newest_first(&mut events);
        Ok(events)
    }

    /// Fetch events sharing at least one tag with the given event, newest first
    async fn fetch_similar_events(&self, slug: &str) -> Result<Vec<Event>> {
        let events = self.events.lock().await;
        let event = events
            .values()
            .find(|event| event.slug == slug)
            .ok_or_else(|| create_error!(NotFound))?;

        let mut similar: Vec<Event> = events
            .values()
            .filter(|other| other.id != event.id)
            .filter(|other| other.tags.iter().any(|tag| event.tags.contains(tag)))
            .cloned()
            .collect();

        newest_first(&mut similar);
        Ok(similar)
    }

    /// Check whether an event with the given id exists
    async fn event_exists(&self, id: &str) -> Result<bool> {
        let events = self.events.lock().await;
        Ok(events.contains_key(id))
    }

    /// Update an event with a normalised change-set
    async fn update_event(&self, id: &str, partial: &PartialEvent) -> Result<()> {
        let mut events = self.events.lock().await;
        if let Some(slug) = &partial.slug {
            if events
                .values()
                .any(|other| other.id != id && &other.slug == slug)
            {
                return Err(create_error!(UniquenessViolation {
                    collection: "events".to_string(),
                    field: "slug".to_string()
                }));
            }
        }

        if let Some(event) = events.get_mut(id) {
            event.apply_options(partial.clone());
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
