use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Activity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub name: String,
    pub category: String,
    pub duration: f64,
    pub location: String,
    #[serde(default)]
    pub day: Option<i32>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Activity {
    pub fn from_seed(trip_id: ObjectId, seed: ActivitySeed) -> Self {
        Self {
            id: None,
            trip_id,
            name: seed.name,
            category: seed.category,
            duration: seed.duration,
            location: seed.location,
            day: None,
            selected: false,
            created_at: Some(DateTime::now()),
        }
    }
}

/// Selection step: an activity is selected exactly when its name is in the
/// submitted set, regardless of its prior flag. Name is the matching key.
pub fn apply_selection(activities: &mut [Activity], chosen: &std::collections::HashSet<String>) {
    for act in activities.iter_mut() {
        act.selected = chosen.contains(&act.name);
    }
}

/// Decode target for a sourced activity, before it is attached to a trip.
/// Also the row format of the static fallback file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ActivitySeed {
    pub name: String,
    pub category: String,
    #[serde(deserialize_with = "deserialize_flexible_hours")]
    pub duration: f64,
    pub location: String,
}

// Custom deserializer to handle durations the model returns as strings
// ("2 hours", "1.5h") as well as plain numbers.
fn deserialize_flexible_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("duration is not representable as f64")),
        serde_json::Value::String(s) => first_numeric_token(&s)
            .ok_or_else(|| de::Error::custom(format!("no numeric token in duration '{}'", s))),
        other => Err(de::Error::custom(format!(
            "unsupported duration value: {}",
            other
        ))),
    }
}

fn first_numeric_token(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let token: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    token.parse().ok()
}
