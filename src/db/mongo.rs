use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{activity::Activity, trip::Trip};

const DATABASE: &str = "Tripflow";

pub async fn create_mongo_client(uri: &String) -> Arc<Client> {
    println!("Connecting to MongoDB: {}", uri);

    // Configure MongoDB client options with more robust settings
    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    // Set a reasonable timeout for operations
    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    // Set the server API if using MongoDB 5.0+
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    // Create the client and check if it can connect
    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    // Test the connection to make sure it works
    match client
        .database(DATABASE)
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => println!("Successfully connected to MongoDB and verified with ping command"),
        Err(e) => {
            eprintln!("WARNING: Connected to MongoDB but ping test failed: {}", e);
            eprintln!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

pub fn trips(client: &Client) -> Collection<Trip> {
    client.database(DATABASE).collection("Trips")
}

pub fn activities(client: &Client) -> Collection<Activity> {
    client.database(DATABASE).collection("Activities")
}

/// Collections are created lazily by Mongo on first insert; the only schema
/// bootstrap needed is the trip_id lookup index on Activities.
pub async fn ensure_indexes(client: &Client) {
    let index = IndexModel::builder().keys(doc! { "trip_id": 1 }).build();

    match activities(client).create_index(index).await {
        Ok(result) => println!("Ensured activity index: {}", result.index_name),
        Err(e) => {
            eprintln!("WARNING: Failed to create activity index: {}", e);
            eprintln!("Lookups will still work, but unindexed");
        }
    }
}
