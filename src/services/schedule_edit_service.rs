use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::models::{activity::Activity, trip::Trip};
use crate::services::genai_service::{TextGenError, TextGenerator};

#[derive(Debug)]
pub enum EditParseError {
    InvalidJson(serde_json::Error),
}

impl fmt::Display for EditParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditParseError::InvalidJson(err) => {
                write!(f, "reply is not a day mapping: {}", err)
            }
        }
    }
}

impl Error for EditParseError {}

pub fn build_edit_prompt(trip: &Trip, unassigned: &[Activity]) -> String {
    let activity_list = unassigned
        .iter()
        .map(|a| format!("- {}, {}, {} hrs, {}", a.name, a.category, a.duration, a.location))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a smart travel planner. I have a trip to {destination} for {num_days} days.
Here are unassigned activities (name, category, duration, location):
{activity_list}

Constraints:
- Max 8 hours/day
- Group nearby activities together
- Mix categories evenly
- Return JSON with day numbers as keys and list of activity names
"#,
        destination = trip.destination,
        num_days = trip.num_days,
        activity_list = activity_list,
    )
}

/// Strict decode: the whole reply must be the day mapping, with no prose
/// around it and no bracket extraction.
pub fn parse_edit_reply(reply: &str) -> Result<BTreeMap<String, Vec<String>>, EditParseError> {
    serde_json::from_str(reply).map_err(EditParseError::InvalidJson)
}

/// Deterministic fallback: activity i goes to day (i mod num_days) + 1.
pub fn round_robin_plan(unassigned: &[Activity], num_days: i32) -> BTreeMap<String, Vec<String>> {
    let mut plan: BTreeMap<String, Vec<String>> = (1..=num_days)
        .map(|day| (day.to_string(), Vec::new()))
        .collect();

    for (i, act) in unassigned.iter().enumerate() {
        let day = (i as i32 % num_days) + 1;
        if let Some(names) = plan.get_mut(&day.to_string()) {
            names.push(act.name.clone());
        }
    }

    plan
}

/// Apply suggested days by first name match, only to activities that are
/// still unassigned. A day already set, by the user or by an earlier
/// suggestion, is never overwritten. Non-numeric day keys are skipped.
pub fn apply_day_suggestions(
    activities: &mut [Activity],
    suggestions: &BTreeMap<String, Vec<String>>,
) {
    for (day_str, names) in suggestions {
        let day: i32 = match day_str.trim().parse() {
            Ok(day) => day,
            Err(_) => continue,
        };
        for name in names {
            if let Some(act) = activities
                .iter_mut()
                .find(|a| a.name == *name && a.day.is_none())
            {
                act.day = Some(day);
            }
        }
    }
}

/// Distribute days for the selected activities that have none, via a model
/// call with the round-robin fallback. Returns false when nothing was
/// unassigned (and no model call was made).
pub async fn fill_unassigned_days(
    generator: &dyn TextGenerator,
    trip: &Trip,
    activities: &mut [Activity],
) -> Result<bool, TextGenError> {
    let unassigned: Vec<Activity> = activities
        .iter()
        .filter(|a| a.day.is_none())
        .cloned()
        .collect();

    if unassigned.is_empty() {
        return Ok(false);
    }

    let prompt = build_edit_prompt(trip, &unassigned);
    let reply = generator.generate(&prompt).await?;

    let suggestions = match parse_edit_reply(&reply) {
        Ok(suggestions) => suggestions,
        Err(e) => {
            log::warn!("Edit reply rejected ({}), using round-robin fallback", e);
            round_robin_plan(&unassigned, trip.num_days)
        }
    };

    apply_day_suggestions(activities, &suggestions);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn activity(name: &str, day: Option<i32>) -> Activity {
        Activity {
            id: Some(ObjectId::new()),
            trip_id: ObjectId::new(),
            name: name.to_string(),
            category: "Nature".to_string(),
            duration: 2.0,
            location: "Harbor".to_string(),
            day,
            selected: true,
            created_at: None,
        }
    }

    #[test]
    fn test_strict_parse_rejects_prose_wrapping() {
        // Unlike the schedule parser, no bracket extraction happens here.
        assert!(parse_edit_reply(r#"Here you go: {"1": ["A"]}"#).is_err());
        assert!(parse_edit_reply(r#"{"1": ["A"]}"#).is_ok());
    }

    #[test]
    fn test_round_robin_wraps_over_days() {
        let acts: Vec<Activity> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|n| activity(n, None))
            .collect();

        let plan = round_robin_plan(&acts, 3);

        assert_eq!(plan["1"], vec!["A".to_string(), "D".to_string()]);
        assert_eq!(plan["2"], vec!["B".to_string(), "E".to_string()]);
        assert_eq!(plan["3"], vec!["C".to_string()]);
    }

    #[test]
    fn test_suggestions_never_overwrite_a_set_day() {
        let mut acts = vec![activity("A", Some(2)), activity("B", None)];
        let mut suggestions = BTreeMap::new();
        suggestions.insert("1".to_string(), vec!["A".to_string(), "B".to_string()]);

        apply_day_suggestions(&mut acts, &suggestions);

        assert_eq!(acts[0].day, Some(2));
        assert_eq!(acts[1].day, Some(1));
    }

    #[test]
    fn test_non_numeric_day_keys_are_skipped() {
        let mut acts = vec![activity("A", None)];
        let mut suggestions = BTreeMap::new();
        suggestions.insert("someday".to_string(), vec!["A".to_string()]);

        apply_day_suggestions(&mut acts, &suggestions);

        assert_eq!(acts[0].day, None);
    }
}
