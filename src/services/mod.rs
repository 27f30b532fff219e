pub mod genai_service;
pub mod render_service;
pub mod schedule_edit_service;
pub mod schedule_service;
pub mod sourcing_service;
