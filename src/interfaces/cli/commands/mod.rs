//! CLI command implementations

mod backup;
mod bots;
mod config_gen;
mod dashboard;
mod database;

pub use backup::{backup_now, restore_now};
pub use bots::list_bots;
pub use config_gen::config_generate;
pub use dashboard::show_dashboard;
pub use database::{dump_clicks, init_db};
