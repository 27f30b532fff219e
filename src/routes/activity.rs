use actix_web::{web, HttpResponse, Responder};
use handlebars::Handlebars;
use mongodb::bson::doc;
use mongodb::Client;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use url::form_urlencoded;

use crate::db;
use crate::models::activity::{apply_selection, Activity};
use crate::routes::{fetch_trip_activities, load_trip, see_other};
use crate::services::genai_service::TextGenerator;
use crate::services::render_service::{activity_context, render_page, trip_context};
use crate::services::sourcing_service::source_if_empty;

/*
    GET /activities/{trip_id}

    Sources the candidate list exactly once: only a trip with zero activity
    rows triggers the model call / fallback. Later views just render.
*/
pub async fn list_activities(
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

    let mut activities = match fetch_trip_activities(&client, trip_id, false).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    match source_if_empty(generator.get_ref().as_ref(), &trip, &activities).await {
        Ok(None) => {}
        Ok(Some(seeds)) => {
            let rows: Vec<Activity> = seeds
                .into_iter()
                .map(|seed| Activity::from_seed(trip_id, seed))
                .collect();

            if let Err(err) = db::mongo::activities(&client).insert_many(&rows).await {
                eprintln!("Failed to insert activities: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to save activities.");
            }

            // Re-read so rendered rows carry their _ids
            activities = match fetch_trip_activities(&client, trip_id, false).await {
                Ok(activities) => activities,
                Err(response) => return response,
            };
        }
        Err(err) => {
            eprintln!("Failed to source activities: {}", err);
            return HttpResponse::InternalServerError().body("Failed to source activities.");
        }
    }

    let context = json!({
        "trip": trip_context(&trip),
        "activities": activities.iter().map(activity_context).collect::<Vec<_>>(),
    });
    render_page(hbs.get_ref(), "activities", &context)
}

/*
    POST /activities/{trip_id}

    Checkbox submission; repeated `activities` keys, so the body is parsed
    with form_urlencoded rather than web::Form.
*/
pub async fn select_activities(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    body: web::Bytes,
) -> impl Responder {
    let client = data.into_inner();
    let (trip_id, _trip) = match load_trip(&client, path.into_inner().as_str()).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let chosen: HashSet<String> = form_urlencoded::parse(&body)
        .filter(|(key, _)| key == "activities")
        .map(|(_, value)| value.into_owned())
        .collect();

    let mut activities = match fetch_trip_activities(&client, trip_id, false).await {
        Ok(activities) => activities,
        Err(response) => return response,
    };

    apply_selection(&mut activities, &chosen);

    let collection = db::mongo::activities(&client);
    for act in &activities {
        if let Some(id) = act.id {
            if let Err(err) = collection
                .update_one(doc! { "_id": id }, doc! { "$set": { "selected": act.selected } })
                .await
            {
                eprintln!("Failed to update activity selection: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to save selection.");
            }
        }
    }

    see_other(&format!("/schedule/{}", trip_id.to_hex()))
}
