use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use tripflow_api::models::activity::Activity;
use tripflow_api::models::trip::Trip;
use tripflow_api::services::genai_service::{TextGenError, TextGenerator};
use tripflow_api::services::schedule_edit_service::fill_unassigned_days;
use tripflow_api::services::schedule_service::{
    assign_days, day_plan, parse_schedule_reply, repair_day_coverage,
};
use tripflow_api::services::sourcing_service::{
    load_fallback_activities, source_activities, source_if_empty, FALLBACK_ACTIVITIES_PATH,
};

struct FakeGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, TextGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn trip(num_days: i32, notes: &str) -> Trip {
    Trip {
        id: Some(ObjectId::new()),
        destination: "Porto".to_string(),
        start_date: "2026-09-01".to_string(),
        num_days,
        notes: notes.to_string(),
        created_at: None,
    }
}

fn selected(name: &str, duration: f64) -> Activity {
    Activity {
        id: Some(ObjectId::new()),
        trip_id: ObjectId::new(),
        name: name.to_string(),
        category: "Culture".to_string(),
        duration,
        location: "Ribeira".to_string(),
        day: None,
        selected: true,
        created_at: None,
    }
}

#[actix_web::test]
async fn test_ai_sourcing_parses_generated_list() {
    let reply = r#"Here is your list:
[
  {"name": "Livraria Lello", "category": "Culture", "duration": 1, "location": "Centro"},
  {"name": "Douro Boat Ride", "category": "Leisure", "duration": "1.5 hours", "location": "Ribeira"},
  {"name": "Port Wine Cellars", "category": "Food", "duration": 2, "location": "Gaia"},
  {"name": "Serralves Park", "category": "Nature", "duration": 2.5, "location": "Boavista"},
  {"name": "Bolhao Market", "category": "Shopping", "duration": 1, "location": "Centro"},
  {"name": "Se Cathedral", "category": "Culture", "duration": 1, "location": "Batalha"}
]"#;
    let generator = FakeGenerator::new(reply);

    let seeds = source_activities(&generator, &trip(3, "wine and old bookshops"))
        .await
        .unwrap();

    assert!(seeds.len() >= 6 && seeds.len() <= 9);
    assert_eq!(seeds[1].duration, 1.5);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn test_garbage_reply_falls_back_to_static_list() {
    let generator = FakeGenerator::new("I'm sorry, I cannot help with that.");
    let fallback = load_fallback_activities(FALLBACK_ACTIVITIES_PATH).unwrap();

    let seeds = source_activities(&generator, &trip(3, "wine"))
        .await
        .unwrap();

    assert_eq!(seeds.len(), fallback.len());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn test_empty_notes_skip_the_model() {
    let generator = FakeGenerator::new("should never be asked");
    let fallback = load_fallback_activities(FALLBACK_ACTIVITIES_PATH).unwrap();

    let seeds = source_activities(&generator, &trip(3, "   ")).await.unwrap();

    assert_eq!(seeds.len(), fallback.len());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_existing_rows_suppress_resourcing() {
    // Second and later views of the activities page must not re-source,
    // even for a trip whose notes would otherwise trigger the model.
    let generator = FakeGenerator::new("should never be asked");
    let existing = vec![selected("Livraria Lello", 1.0), selected("Se Cathedral", 1.0)];

    let sourced = source_if_empty(&generator, &trip(3, "wine and old bookshops"), &existing)
        .await
        .unwrap();

    assert!(sourced.is_none());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_trip_without_rows_is_sourced_once() {
    let reply = r#"[
  {"name": "Livraria Lello", "category": "Culture", "duration": 1, "location": "Centro"},
  {"name": "Douro Boat Ride", "category": "Leisure", "duration": 1.5, "location": "Ribeira"},
  {"name": "Port Wine Cellars", "category": "Food", "duration": 2, "location": "Gaia"},
  {"name": "Serralves Park", "category": "Nature", "duration": 2.5, "location": "Boavista"},
  {"name": "Bolhao Market", "category": "Shopping", "duration": 1, "location": "Centro"},
  {"name": "Se Cathedral", "category": "Culture", "duration": 1, "location": "Batalha"}
]"#;
    let generator = FakeGenerator::new(reply);

    let sourced = source_if_empty(&generator, &trip(3, "wine"), &[])
        .await
        .unwrap();

    assert_eq!(sourced.unwrap().len(), 6);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn test_schedule_reply_drives_day_assignment() {
    let reply = r#"SCHEDULE:
{"Day 1": ["Livraria Lello", "Se Cathedral"], "Day 2": ["Douro Boat Ride"]}

JUSTIFICATION:
Day 1 keeps the downtown pair together; day 2 is for the river."#;

    let t = trip(2, "");
    let mut activities = vec![
        selected("Livraria Lello", 1.0),
        selected("Se Cathedral", 1.0),
        selected("Douro Boat Ride", 1.5),
    ];

    let (plan, justification) = parse_schedule_reply(reply, t.num_days);
    assign_days(&mut activities, &plan, t.num_days);
    repair_day_coverage(&mut activities, t.num_days);
    let grouped = day_plan(&activities, t.num_days);

    assert_eq!(grouped[&1].len(), 2);
    assert_eq!(grouped[&2].len(), 1);
    assert_eq!(grouped[&2][0].name, "Douro Boat Ride");
    assert!(justification.starts_with("Day 1 keeps"));
}

#[actix_web::test]
async fn test_repair_covers_a_day_the_model_left_empty() {
    let reply = r#"SCHEDULE:
{"1": ["A", "B"]}"#;

    let t = trip(2, "");
    let mut activities = vec![selected("A", 2.0), selected("B", 2.0)];

    let (plan, _) = parse_schedule_reply(reply, t.num_days);
    assign_days(&mut activities, &plan, t.num_days);
    repair_day_coverage(&mut activities, t.num_days);

    let grouped = day_plan(&activities, t.num_days);
    assert!(!grouped[&1].is_empty());
    assert!(!grouped[&2].is_empty());
}

#[actix_web::test]
async fn test_unparsable_edit_reply_round_robins() {
    let generator = FakeGenerator::new("No JSON today.");
    let t = trip(3, "");

    // One day set by the user, four still unassigned
    let mut activities = vec![
        selected("A", 2.0),
        selected("B", 2.0),
        selected("C", 2.0),
        selected("D", 2.0),
        selected("E", 2.0),
    ];
    activities[1].day = Some(2);

    let changed = fill_unassigned_days(&generator, &t, &mut activities)
        .await
        .unwrap();

    assert!(changed);
    // Unassigned were A, C, D, E in order: days 1, 2, 3, 1
    assert_eq!(activities[0].day, Some(1));
    assert_eq!(activities[1].day, Some(2)); // user-set, untouched
    assert_eq!(activities[2].day, Some(2));
    assert_eq!(activities[3].day, Some(3));
    assert_eq!(activities[4].day, Some(1));
}

#[actix_web::test]
async fn test_edit_reply_applies_only_to_unassigned() {
    let generator = FakeGenerator::new(r#"{"3": ["A", "B"]}"#);
    let t = trip(3, "");

    let mut activities = vec![selected("A", 2.0), selected("B", 2.0)];
    activities[0].day = Some(1);

    fill_unassigned_days(&generator, &t, &mut activities)
        .await
        .unwrap();

    assert_eq!(activities[0].day, Some(1));
    assert_eq!(activities[1].day, Some(3));
}

#[actix_web::test]
async fn test_fully_assigned_trip_makes_no_model_call() {
    let generator = FakeGenerator::new("should never be asked");
    let t = trip(2, "");

    let mut activities = vec![selected("A", 2.0)];
    activities[0].day = Some(1);

    let changed = fill_unassigned_days(&generator, &t, &mut activities)
        .await
        .unwrap();

    assert!(!changed);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}
