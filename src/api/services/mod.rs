pub mod health;
pub mod tracker;

pub use health::{AppStartTime, HealthService, health_routes};
pub use tracker::{TRACKING_PATH, TrackerService, tracker_routes};
