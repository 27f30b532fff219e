pub mod activity;
pub mod home;
pub mod schedule;
pub mod share;
pub mod trip;

use actix_web::{http::header, HttpResponse};
use bson::doc;
use futures::TryStreamExt;
use mongodb::{bson::oid::ObjectId, Client};

use crate::db;
use crate::models::{activity::Activity, trip::Trip};

/// Redirect-after-POST.
pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Resolve a trip from its raw path id. A malformed id is a 400, an unknown
/// one a 404; both come back as ready-made responses.
pub(crate) async fn load_trip(
    client: &Client,
    raw_id: &str,
) -> Result<(ObjectId, Trip), HttpResponse> {
    let id = match ObjectId::parse_str(raw_id) {
        Ok(id) => id,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid trip ID")),
    };

    match db::mongo::trips(client).find_one(doc! { "_id": id }).await {
        Ok(Some(trip)) => Ok((id, trip)),
        Ok(None) => Err(HttpResponse::NotFound().body("Trip not found")),
        Err(err) => {
            eprintln!("Failed to retrieve trip: {:?}", err);
            Err(HttpResponse::InternalServerError().body("Failed to retrieve trip"))
        }
    }
}

/// A trip's activities in insertion (_id) order; every "first match" rule
/// downstream depends on this ordering.
pub(crate) async fn fetch_trip_activities(
    client: &Client,
    trip_id: ObjectId,
    selected_only: bool,
) -> Result<Vec<Activity>, HttpResponse> {
    let filter = if selected_only {
        doc! { "trip_id": trip_id, "selected": true }
    } else {
        doc! { "trip_id": trip_id }
    };

    match db::mongo::activities(client)
        .find(filter)
        .sort(doc! { "_id": 1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Activity>>().await {
            Ok(activities) => Ok(activities),
            Err(err) => {
                eprintln!("Failed to collect activities: {:?}", err);
                Err(HttpResponse::InternalServerError().body("Failed to collect activities."))
            }
        },
        Err(err) => {
            eprintln!("Failed to find activities: {:?}", err);
            Err(HttpResponse::InternalServerError().body("Failed to find activities."))
        }
    }
}

/// Write back the day field of every given activity.
pub(crate) async fn persist_days(client: &Client, activities: &[Activity]) -> Result<(), HttpResponse> {
    let collection = db::mongo::activities(client);

    for act in activities {
        if let Some(id) = act.id {
            if let Err(err) = collection
                .update_one(doc! { "_id": id }, doc! { "$set": { "day": act.day } })
                .await
            {
                eprintln!("Failed to update activity day: {:?}", err);
                return Err(HttpResponse::InternalServerError().body("Failed to update schedule."));
            }
        }
    }

    Ok(())
}
