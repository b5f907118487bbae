use std::fmt::Write as _;
use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::services::{ClickTracker, VisitDecision};
use crate::utils::ip::extract_client_ip;

/// 跟踪入口路径
pub const TRACKING_PATH: &str = "/saved";

pub struct TrackerService;

impl TrackerService {
    pub async fn handle_saved(
        req: HttpRequest,
        tracker: web::Data<Arc<ClickTracker>>,
    ) -> impl Responder {
        let ip = extract_client_ip(&req);
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let settings = tracker.settings();
        let has_cookie = req.cookie(&settings.cookie_name).is_some();
        let decision = tracker.decide(&user_agent, has_cookie);

        if settings.enable_debug && Self::is_debug_request(&req) {
            return Self::debug_response(&tracker, &ip, &user_agent, &decision).await;
        }

        if !decision.should_record() {
            debug!("Visit from {} not logged: {}", ip, decision);
            return Self::redirect_response(&tracker, false);
        }

        match tracker.record(ip, user_agent).await {
            Ok(click) => {
                trace!("Visit stored as click #{}", click.id);
                Self::redirect_response(&tracker, true)
            }
            Err(e) => {
                error!("Failed to store click: {}", e);
                Self::error_response()
            }
        }
    }

    /// `?debug=1` 或 `?debug=true`
    fn is_debug_request(req: &HttpRequest) -> bool {
        req.query_string()
            .split('&')
            .filter_map(|part| part.strip_prefix("debug="))
            .any(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    fn redirect_response(tracker: &ClickTracker, set_cookie: bool) -> HttpResponse {
        let settings = tracker.settings();
        let mut builder = HttpResponse::Found();
        builder.insert_header(("Location", settings.redirect_url.as_str()));

        if set_cookie {
            let cookie = Cookie::build(settings.cookie_name.clone(), "1")
                .max_age(CookieDuration::seconds(settings.cookie_max_age_secs))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish();
            builder.cookie(cookie);
        }

        builder.finish()
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("Internal Server Error")
    }

    /// 诊断输出：不写库、不设置 cookie
    async fn debug_response(
        tracker: &ClickTracker,
        ip: &str,
        user_agent: &str,
        decision: &VisitDecision,
    ) -> HttpResponse {
        let geo = match tracker.locate(ip).await {
            Some(outcome) => outcome.to_string(),
            None => "skipped".to_string(),
        };

        let mut body = String::new();
        let _ = writeln!(body, "ip: {}", ip);
        let _ = writeln!(body, "user_agent: {}", user_agent);
        let _ = writeln!(body, "decision: {}", decision);
        let _ = writeln!(body, "geolocation: {}", geo);
        let _ = writeln!(body, "redirect: {}", tracker.settings().redirect_url);

        HttpResponse::Ok()
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .body(body)
    }
}

/// Tracker 路由配置
pub fn tracker_routes() -> actix_web::Resource {
    web::resource(TRACKING_PATH)
        .route(web::get().to(TrackerService::handle_saved))
        .route(web::head().to(TrackerService::handle_saved))
}
