pub mod activity;
pub mod trip;
