mod r#impl;
mod structs;
pub mod types;
pub mod validators;

pub use r#impl::{get_config, init_config};
pub use structs::*;
pub use types::{BotSignature, GeoProviderKind};
pub use validators::{validate_config, validate_redirect_url};
