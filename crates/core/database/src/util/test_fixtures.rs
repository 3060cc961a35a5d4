use crate::DataCreateEvent;

/// A complete event candidate with loose date and time input
pub fn event_candidate(title: &str) -> DataCreateEvent {
    DataCreateEvent {
        title: Some(title.to_string()),
        description: Some("A day of talks and workshops.".to_string()),
        overview: Some("Talks and workshops.".to_string()),
        image: Some("/images/event1.png".to_string()),
        venue: Some("Moscone Center".to_string()),
        location: Some("San Francisco, CA".to_string()),
        date: Some("March 5, 2025".to_string()),
        time: Some("9:05am".to_string()),
        mode: Some("hybrid".to_string()),
        audience: Some("Developers".to_string()),
        agenda: Some(vec!["Keynote".to_string(), "Workshops".to_string()]),
        organizer: Some("Evently".to_string()),
        tags: Some(vec!["rust".to_string(), "web".to_string()]),
    }
}
