use std::error::Error;
use std::fmt;

use crate::models::{
    activity::{Activity, ActivitySeed},
    trip::Trip,
};
use crate::services::genai_service::TextGenerator;

pub const FALLBACK_ACTIVITIES_PATH: &str = "data/activities.json";

#[derive(Debug)]
pub enum SourcingError {
    NoJsonArray,
    InvalidJson(serde_json::Error),
    Empty,
}

impl fmt::Display for SourcingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcingError::NoJsonArray => write!(f, "reply contains no JSON array"),
            SourcingError::InvalidJson(err) => write!(f, "reply array is not valid JSON: {}", err),
            SourcingError::Empty => write!(f, "reply array is empty"),
        }
    }
}

impl Error for SourcingError {}

pub fn build_sourcing_prompt(trip: &Trip) -> String {
    format!(
        r#"You are a travel planner. The user is visiting {destination}.
User notes / interests: {notes}
Give more weight to user notes when generating activities.

Generate a list of 6-9 activities with:
- name
- category (Culture, Nature, Food, Leisure, Shopping)
- duration in hours
- location (city area)
- ensure all fields are present
- return at least 6 activities
- ensure that the response is valid JSON
Return JSON only:
[{{"name": "...", "category": "...", "duration": 2, "location": "..."}}]
"#,
        destination = trip.destination,
        notes = trip.notes,
    )
}

/// First `[` through last `]`, the span a greedy bracket match would take.
pub fn extract_first_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Strict decode of a sourcing reply. The caller decides what a failure
/// falls back to; the error names the reason.
pub fn parse_activity_reply(reply: &str) -> Result<Vec<ActivitySeed>, SourcingError> {
    let raw = extract_first_array(reply).ok_or(SourcingError::NoJsonArray)?;
    let seeds: Vec<ActivitySeed> =
        serde_json::from_str(raw).map_err(SourcingError::InvalidJson)?;
    if seeds.is_empty() {
        return Err(SourcingError::Empty);
    }
    Ok(seeds)
}

pub fn load_fallback_activities(path: &str) -> Result<Vec<ActivitySeed>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    let seeds: Vec<ActivitySeed> = serde_json::from_str(&contents)?;
    Ok(seeds)
}

/// Obtain the candidate activity list for a trip: model call when the trip
/// has notes, static fallback otherwise or when the reply does not decode.
/// A transport-level generation failure propagates to the caller.
pub async fn source_activities(
    generator: &dyn TextGenerator,
    trip: &Trip,
) -> Result<Vec<ActivitySeed>, Box<dyn Error>> {
    if !trip.notes.trim().is_empty() {
        let prompt = build_sourcing_prompt(trip);
        let reply = generator.generate(&prompt).await?;

        match parse_activity_reply(&reply) {
            Ok(seeds) => return Ok(seeds),
            Err(e) => log::warn!("Sourcing reply rejected ({}), using fallback list", e),
        }
    }

    load_fallback_activities(FALLBACK_ACTIVITIES_PATH)
}

/// The source-once guard: a trip that already has activity rows is never
/// re-sourced, no matter how often its list is viewed. Returns None when the
/// existing rows stand as-is.
pub async fn source_if_empty(
    generator: &dyn TextGenerator,
    trip: &Trip,
    existing: &[Activity],
) -> Result<Option<Vec<ActivitySeed>>, Box<dyn Error>> {
    if !existing.is_empty() {
        return Ok(None);
    }

    source_activities(generator, trip).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(notes: &str) -> Trip {
        Trip {
            id: None,
            destination: "Lisbon".to_string(),
            start_date: "2026-09-01".to_string(),
            num_days: 3,
            notes: notes.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_prompt_carries_destination_and_notes() {
        let prompt = build_sourcing_prompt(&trip("seafood and fado"));
        assert!(prompt.contains("Lisbon"));
        assert!(prompt.contains("seafood and fado"));
        assert!(prompt.contains("6-9 activities"));
    }

    #[test]
    fn test_array_is_extracted_from_prose() {
        let reply = r#"Sure! Here are some ideas:
[{"name": "Alfama walk", "category": "Culture", "duration": 2, "location": "Alfama"},
 {"name": "Time Out Market", "category": "Food", "duration": "1.5 hours", "location": "Cais do Sodre"}]
Enjoy your trip!"#;

        let seeds = parse_activity_reply(reply).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].name, "Alfama walk");
        assert_eq!(seeds[1].duration, 1.5);
    }

    #[test]
    fn test_reply_without_array_is_tagged() {
        assert!(matches!(
            parse_activity_reply("I could not produce a list."),
            Err(SourcingError::NoJsonArray)
        ));
    }

    #[test]
    fn test_malformed_array_is_tagged() {
        assert!(matches!(
            parse_activity_reply(r#"[{"name": "x", "category": }]"#),
            Err(SourcingError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_empty_array_is_tagged() {
        assert!(matches!(
            parse_activity_reply("[]"),
            Err(SourcingError::Empty)
        ));
    }
}
