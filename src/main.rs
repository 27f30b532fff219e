use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use tripflow_api::db;
use tripflow_api::routes;
use tripflow_api::services::genai_service::{GeminiClient, TextGenerator};
use tripflow_api::services::render_service::build_renderer;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    db::mongo::ensure_indexes(&client).await;
    println!("MongoDB connection established");

    let generator: Arc<dyn TextGenerator> =
        Arc::new(GeminiClient::new().expect("GEMINI_API_KEY must be set"));
    let renderer = web::Data::new(build_renderer());

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(generator.clone()))
            .app_data(renderer.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/", web::get().to(routes::home::index))
            .route("/create_trip", web::post().to(routes::trip::create_trip))
            .route(
                "/activities/{trip_id}",
                web::get().to(routes::activity::list_activities),
            )
            .route(
                "/activities/{trip_id}",
                web::post().to(routes::activity::select_activities),
            )
            .route(
                "/schedule/{trip_id}",
                web::get().to(routes::schedule::generate_schedule),
            )
            .route(
                "/edit_schedule/{trip_id}",
                web::get().to(routes::schedule::edit_schedule),
            )
            .route(
                "/edit_schedule/{trip_id}",
                web::post().to(routes::schedule::save_schedule),
            )
            .route(
                "/share/{trip_id}",
                web::get().to(routes::share::share_itinerary),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
