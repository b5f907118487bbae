//! HTTP services

pub mod services;

use actix_web::web;

/// 注册全部路由（服务器和测试共用）
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(services::health_routes())
        .service(services::tracker_routes());
}
