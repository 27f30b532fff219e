use std::collections::BTreeMap;

use actix_web::{http::header::ContentType, HttpResponse};
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::models::{activity::Activity, trip::Trip};

/// Register the embedded page templates. Called once at startup; a template
/// that fails to register is a build defect, so this panics.
pub fn build_renderer() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    for (name, template) in [
        ("index", include_str!("../../templates/index.hbs")),
        ("activities", include_str!("../../templates/activities.hbs")),
        ("itinerary", include_str!("../../templates/itinerary.hbs")),
        ("edit_itinerary", include_str!("../../templates/edit_itinerary.hbs")),
        ("share", include_str!("../../templates/share.hbs")),
    ] {
        hbs.register_template_string(name, template)
            .unwrap_or_else(|e| panic!("Failed to register template '{}': {}", name, e));
    }

    hbs
}

pub fn render_page(hbs: &Handlebars<'_>, name: &str, context: &Value) -> HttpResponse {
    match hbs.render(name, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(err) => {
            eprintln!("Failed to render template '{}': {:?}", name, err);
            HttpResponse::InternalServerError().body("Failed to render page")
        }
    }
}

pub fn trip_context(trip: &Trip) -> Value {
    json!({
        "id": trip.id.map(|id| id.to_hex()).unwrap_or_default(),
        "destination": trip.destination,
        "start_date": trip.start_date,
        "num_days": trip.num_days,
        "notes": trip.notes,
    })
}

pub fn activity_context(activity: &Activity) -> Value {
    json!({
        "id": activity.id.map(|id| id.to_hex()).unwrap_or_default(),
        "name": activity.name,
        "category": activity.category,
        "duration": activity.duration,
        "location": activity.location,
        "day": activity.day,
        "selected": activity.selected,
    })
}

/// Day plan as an array of {day, activities} rows, the shape the templates
/// iterate over.
pub fn day_plan_context(plan: &BTreeMap<i32, Vec<Activity>>) -> Value {
    Value::Array(
        plan.iter()
            .map(|(day, activities)| {
                json!({
                    "day": day,
                    "activities": activities.iter().map(activity_context).collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}
