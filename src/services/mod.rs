//! Service layer
//!
//! 与 HTTP 无关的业务逻辑，供 HTTP handler 和 CLI 共用。

pub mod backup;
pub mod bot_filter;
pub mod click_tracker;
pub mod geoip;

pub use backup::{BackupService, BackupStore, GistBackupStore};
pub use bot_filter::BotFilter;
pub use click_tracker::{ClickTracker, VisitDecision};
pub use geoip::{GeoIpProvider, GeoLocator, GeoPoint, GeoResolution, HttpLocator};
