use actix_web::{web, HttpResponse, Responder};
use handlebars::Handlebars;
use mongodb::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use url::form_urlencoded;

use crate::routes::{fetch_trip_activities, load_trip, persist_days, see_other};
use crate::services::genai_service::TextGenerator;
use crate::services::render_service::{
    activity_context, day_plan_context, render_page, trip_context,
};
use crate::services::schedule_edit_service::fill_unassigned_days;
use crate::services::schedule_service::{
    assign_days, build_schedule_prompt, day_plan, parse_schedule_reply, repair_day_coverage,
};

/*
    GET /schedule/{trip_id}

    Asks the model for a day mapping over the selected activities, assigns
    days under the 8-hour budget, then repairs empty days. A transport-level
    model failure is a 500; a malformed reply just yields an empty mapping.
*/
pub async fn generate_schedule(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    generator: web::Data<Arc<dyn TextGenerator>>,
    hbs: web::Data<Handlebars<'static>>,
) -> impl Responder {
    let client = data.into_inner();
    let (trip_id, trip) = match load_trip(&client, path.into_inner().as_str()).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let mut activities = match fetch_trip_activities(&client, trip_id, true).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    let prompt = build_schedule_prompt(&trip, &activities);
    let reply = match generator.generate(&prompt).await {
        Ok(reply) => reply,
        Err(err) => {
            eprintln!("Failed to generate schedule: {}", err);
            return HttpResponse::InternalServerError().body("Failed to generate schedule.");
        }
    };
    log::debug!("Schedule reply: {}", reply);

    let (plan, justification) = parse_schedule_reply(&reply, trip.num_days);
    assign_days(&mut activities, &plan, trip.num_days);
    repair_day_coverage(&mut activities, trip.num_days);

    if let Err(response) = persist_days(&client, &activities).await {
        return response;
    }

    let grouped = day_plan(&activities, trip.num_days);
    let context = json!({
        "trip": trip_context(&trip),
        "day_plan": day_plan_context(&grouped),
        "justification": justification,
    });
    render_page(hbs.get_ref(), "itinerary", &context)
}

/*
    GET /edit_schedule/{trip_id}

    Shows the day-edit form. Selected activities still missing a day are
    distributed first via a second model call, falling back to round-robin;
    days the user already set are left alone.
*/
pub async fn edit_schedule(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    generator: web::Data<Arc<dyn TextGenerator>>,
    hbs: web::Data<Handlebars<'static>>,
) -> impl Responder {
    let client = data.into_inner();
    let (trip_id, trip) = match load_trip(&client, path.into_inner().as_str()).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let mut activities = match fetch_trip_activities(&client, trip_id, true).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    match fill_unassigned_days(generator.get_ref().as_ref(), &trip, &mut activities).await {
        Ok(true) => {
            if let Err(response) = persist_days(&client, &activities).await {
                return response;
            }
        }
        Ok(false) => {}
        Err(err) => {
            eprintln!("Failed to distribute unassigned activities: {}", err);
            return HttpResponse::InternalServerError().body("Failed to distribute activities.");
        }
    }

    let grouped = day_plan(&activities, trip.num_days);
    let context = json!({
        "trip": trip_context(&trip),
        "day_plan": day_plan_context(&grouped),
        "activities": activities.iter().map(activity_context).collect::<Vec<_>>(),
    });
    render_page(hbs.get_ref(), "edit_itinerary", &context)
}

/*
    POST /edit_schedule/{trip_id}

    Dynamic day_{id} fields. A submitted day overwrites unconditionally,
    with no range or hour-cap validation.
*/
pub async fn save_schedule(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    body: web::Bytes,
) -> impl Responder {
    let client = data.into_inner();
    let (trip_id, _trip) = match load_trip(&client, path.into_inner().as_str()).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let fields: HashMap<String, String> = form_urlencoded::parse(&body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut activities = match fetch_trip_activities(&client, trip_id, true).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    for act in activities.iter_mut() {
        if let Some(id) = act.id {
            let field = format!("day_{}", id.to_hex());
            if let Some(new_day) = fields.get(&field).and_then(|v| v.trim().parse::<i32>().ok()) {
                act.day = Some(new_day);
            }
        }
    }

    if let Err(response) = persist_days(&client, &activities).await {
        return response;
    }

    see_other(&format!("/share/{}", trip_id.to_hex()))
}
