//! Dashboard command

use std::sync::Arc;

use crate::config::get_config;
use crate::dashboard::{DashboardOptions, run_dashboard};
use crate::interfaces::cli::CliError;
use crate::services::{GeoIpProvider, GeoLocator};
use crate::storage::SeaOrmStorage;

pub async fn show_dashboard(
    storage: Arc<SeaOrmStorage>,
    options: DashboardOptions,
) -> Result<(), CliError> {
    let config = get_config();
    let locator: Option<Arc<dyn GeoLocator>> = config
        .geoip
        .enabled
        .then(|| Arc::new(GeoIpProvider::new(&config.geoip)) as Arc<dyn GeoLocator>);

    run_dashboard(&storage, locator.as_ref(), &options).await?;
    Ok(())
}
