pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20240601_000001_clicks;
mod m20240601_000002_click_coordinates;
mod m20240601_000003_dm_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_clicks::Migration),
            Box::new(m20240601_000002_click_coordinates::Migration),
            Box::new(m20240601_000003_dm_log::Migration),
        ]
    }
}
