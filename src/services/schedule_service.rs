use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt;

use regex::Regex;

use crate::models::{activity::Activity, trip::Trip};

pub const MAX_HOURS_PER_DAY: f64 = 8.0;
pub const NO_JUSTIFICATION: &str = "No justification provided.";

#[derive(Debug)]
pub enum ScheduleParseError {
    NoJsonObject,
    InvalidJson(serde_json::Error),
}

impl fmt::Display for ScheduleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleParseError::NoJsonObject => write!(f, "reply contains no JSON object"),
            ScheduleParseError::InvalidJson(err) => {
                write!(f, "reply object is not a day mapping: {}", err)
            }
        }
    }
}

impl Error for ScheduleParseError {}

pub fn build_schedule_prompt(trip: &Trip, activities: &[Activity]) -> String {
    let activity_list = activities
        .iter()
        .map(|a| format!("- {}, {}, {} hrs, {}", a.name, a.category, a.duration, a.location))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a professional travel planner.

Trip: {destination}, {num_days} days
Activities:
{activity_list}

Your task:
1. Distribute activities across {num_days} days logically.
2. Group activities that are close by (by location).
3. Mix categories reasonably.
4. Max 8 hours/day.
5. If {num_days} equals number of activities, assign one per day.
6. Return TWO sections:

SCHEDULE:
JSON object, keys=day numbers, values=list of activity names in order.

JUSTIFICATION:
Explain in 2-3 lines per day why these activities were grouped.
"#,
        destination = trip.destination,
        num_days = trip.num_days,
        activity_list = activity_list,
    )
}

/// Split a reply on the literal `JUSTIFICATION:` marker. Without the marker
/// the whole reply is the schedule section.
pub fn split_justification(reply: &str) -> (&str, &str) {
    match reply.split_once("JUSTIFICATION:") {
        Some((schedule, justification)) => (schedule, justification),
        None => (reply, NO_JUSTIFICATION),
    }
}

/// First `{` through last `}`, the span a greedy bracket match would take.
pub fn extract_first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Strict decode of the schedule section into a day -> activity-names map.
///
/// Keys are normalized by their first digit run ("Day 1" -> 1); keys with no
/// digit, or outside [1, num_days], are discarded. The BTreeMap fixes the
/// iteration order the assignment pass sees to ascending numeric.
pub fn parse_day_plan(
    schedule_part: &str,
    num_days: i32,
) -> Result<BTreeMap<i32, Vec<String>>, ScheduleParseError> {
    let raw = extract_first_object(schedule_part).ok_or(ScheduleParseError::NoJsonObject)?;
    let parsed: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(ScheduleParseError::InvalidJson)?;

    let digits = Regex::new(r"\d+").unwrap();
    let mut plan = BTreeMap::new();

    for (key, value) in parsed {
        let day = match digits.find(&key).and_then(|m| m.as_str().parse::<i32>().ok()) {
            Some(day) => day,
            None => continue,
        };
        if day < 1 || day > num_days {
            continue;
        }

        let names: Vec<String> =
            serde_json::from_value(value).map_err(ScheduleParseError::InvalidJson)?;
        plan.insert(day, names);
    }

    Ok(plan)
}

/// Split the reply into its day mapping and justification. A schedule section
/// that does not decode yields an empty mapping, never an error.
pub fn parse_schedule_reply(reply: &str, num_days: i32) -> (BTreeMap<i32, Vec<String>>, String) {
    let (schedule_part, justification) = split_justification(reply);

    let plan = match parse_day_plan(schedule_part, num_days) {
        Ok(plan) => plan,
        Err(e) => {
            log::warn!("Schedule reply rejected ({}), treating mapping as empty", e);
            BTreeMap::new()
        }
    };

    (plan, justification.trim().to_string())
}

/// Primary assignment pass: walk the parsed mapping in ascending day order,
/// charging each day's running hour total. An activity that would push its
/// day past the 8-hour cap is redirected to the next day (clamped to the
/// last day) and charged there instead. Activities the mapping never names
/// keep day = None.
pub fn assign_days(activities: &mut [Activity], plan: &BTreeMap<i32, Vec<String>>, num_days: i32) {
    let mut day_hours: HashMap<i32, f64> = (1..=num_days).map(|d| (d, 0.0)).collect();

    for (&day, names) in plan {
        for name in names {
            let act = match activities.iter_mut().find(|a| a.name == *name) {
                Some(act) => act,
                None => continue,
            };

            let hours = day_hours.get(&day).copied().unwrap_or(0.0);
            if hours + act.duration > MAX_HOURS_PER_DAY {
                let next_day = if day < num_days { day + 1 } else { day };
                act.day = Some(next_day);
                *day_hours.entry(next_day).or_insert(0.0) += act.duration;
            } else {
                act.day = Some(day);
                *day_hours.entry(day).or_insert(0.0) += act.duration;
            }
        }
    }
}

/// Coverage pass: every day must end up with at least one activity. The
/// assigned-day set is computed once; each empty day takes the first
/// activity currently placed elsewhere, without recomputing hour totals.
/// This mirrors the observed behavior, including its ability to exceed the
/// hour cap or to leave the donor day newly empty.
pub fn repair_day_coverage(activities: &mut [Activity], num_days: i32) {
    let assigned: HashSet<i32> = activities.iter().filter_map(|a| a.day).collect();

    for day in 1..=num_days {
        if assigned.contains(&day) {
            continue;
        }
        if let Some(act) = activities.iter_mut().find(|a| a.day != Some(day)) {
            act.day = Some(day);
        }
    }
}

/// Group activities by their exact assigned day. Every day in
/// [1, num_days] is present, possibly with an empty list.
pub fn day_plan(activities: &[Activity], num_days: i32) -> BTreeMap<i32, Vec<Activity>> {
    (1..=num_days)
        .map(|day| {
            let acts = activities
                .iter()
                .filter(|a| a.day == Some(day))
                .cloned()
                .collect();
            (day, acts)
        })
        .collect()
}

/// Share grouping: every day in [1, num_days] is present, and an unset or
/// non-positive day lands on day 1. A day past num_days (possible after an
/// unvalidated edit) still renders, as its own extra group.
pub fn share_day_plan(activities: Vec<Activity>, num_days: i32) -> BTreeMap<i32, Vec<Activity>> {
    let mut grouped: BTreeMap<i32, Vec<Activity>> =
        (1..=num_days).map(|day| (day, Vec::new())).collect();

    for act in activities {
        let day = match act.day {
            Some(day) if day >= 1 => day,
            _ => 1,
        };
        grouped.entry(day).or_default().push(act);
    }

    grouped
}
