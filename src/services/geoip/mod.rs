//! GeoIP 服务模块
//!
//! IP → 经纬度，支持纯文本接口和 JSON 接口组成的回退链。

mod external_api;
mod provider;

pub use external_api::{HttpLocator, classify_error, parse_json_body, parse_latlong_text};
pub use provider::{GeoIpProvider, GeoLocator, GeoPoint, GeoResolution};
