use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::DateTime;
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::db;
use crate::models::trip::Trip;
use crate::routes::see_other;

#[derive(Debug, Deserialize)]
pub struct CreateTripForm {
    pub destination: String,
    pub start_date: String,
    pub num_days: i32,
    #[serde(default)]
    pub notes: String,
}

/*
    POST /create_trip
*/
pub async fn create_trip(
    data: web::Data<Arc<Client>>,
    form: web::Form<CreateTripForm>,
) -> impl Responder {
    let client = data.into_inner();
    let form = form.into_inner();

    if form.num_days < 1 {
        return HttpResponse::BadRequest().body("Number of days must be positive");
    }

    let trip = Trip {
        id: None,
        destination: form.destination,
        start_date: form.start_date,
        num_days: form.num_days,
        notes: form.notes,
        created_at: Some(DateTime::now()),
    };

    match db::mongo::trips(&client).insert_one(&trip).await {
        Ok(result) => match result.inserted_id.as_object_id() {
            Some(id) => see_other(&format!("/activities/{}", id.to_hex())),
            None => {
                eprintln!("Inserted trip id is not an ObjectId: {:?}", result.inserted_id);
                HttpResponse::InternalServerError().body("Failed to create trip.")
            }
        },
        Err(err) => {
            eprintln!("Failed to insert trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create trip.")
        }
    }
}
