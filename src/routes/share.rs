use actix_web::{web, Responder};
use handlebars::Handlebars;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{fetch_trip_activities, load_trip};
use crate::services::render_service::{day_plan_context, render_page, trip_context};
use crate::services::schedule_service::share_day_plan;

/*
    GET /share/{trip_id}

    Read-only per-day view; an activity that never got a day shows on day 1.
*/
pub async fn share_itinerary(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    hbs: web::Data<Handlebars<'static>>,
) -> impl Responder {
    let client = data.into_inner();
    let (trip_id, trip) = match load_trip(&client, path.into_inner().as_str()).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let activities = match fetch_trip_activities(&client, trip_id, true).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    let grouped = share_day_plan(activities, trip.num_days);

    let context = json!({
        "trip": trip_context(&trip),
        "day_plan": day_plan_context(&grouped),
    });
    render_page(hbs.get_ref(), "share", &context)
}
