//! Tracking endpoint tests
//!
//! `/saved` → filter → geolocate → store → 302 with the dedupe cookie.

use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use tempfile::TempDir;

use clicktrail::api::services::AppStartTime;
use clicktrail::config::{DatabaseConfig, TrackingConfig};
use clicktrail::errors::Result as ClicktrailResult;
use clicktrail::services::{
    BackupService, BackupStore, ClickTracker, GeoLocator, GeoPoint, GeoResolution,
};
use clicktrail::storage::SeaOrmStorage;

// =============================================================================
// Test Setup
// =============================================================================

const REDIRECT: &str = "https://example.com/landing?src=dm";
const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 Version/17.4 Safari/605.1.15";
const PUBLIC_PEER: &str = "203.0.113.10:51000";

/// 固定返回同一结果的定位器
struct StubLocator(GeoResolution);

#[async_trait]
impl GeoLocator for StubLocator {
    async fn locate(&self, _ip: &str) -> GeoResolution {
        self.0.clone()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// 记录每次上传内容的备份存储
#[derive(Default)]
struct RecordingStore {
    uploads: std::sync::Mutex<Vec<String>>,
}

impl RecordingStore {
    fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackupStore for RecordingStore {
    async fn fetch(&self) -> ClicktrailResult<Option<String>> {
        Ok(None)
    }

    async fn store(&self, content: String) -> ClicktrailResult<()> {
        self.uploads.lock().unwrap().push(content);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct TestEnv {
    _dir: TempDir,
    storage: Arc<SeaOrmStorage>,
    tracker: Arc<ClickTracker>,
}

fn tracking_config() -> TrackingConfig {
    TrackingConfig {
        redirect_url: REDIRECT.to_string(),
        ..Default::default()
    }
}

async fn setup_with(settings: TrackingConfig, geo: Option<GeoResolution>) -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("clicks.db").display()),
        ..Default::default()
    };
    let storage = Arc::new(
        SeaOrmStorage::new(&config)
            .await
            .expect("Failed to create storage"),
    );

    let mut tracker = ClickTracker::new(storage.clone(), settings);
    if let Some(outcome) = geo {
        tracker = tracker.with_geoip(Arc::new(StubLocator(outcome)));
    }

    TestEnv {
        _dir: dir,
        storage,
        tracker: Arc::new(tracker),
    }
}

async fn setup(geo: Option<GeoResolution>) -> TestEnv {
    setup_with(tracking_config(), geo).await
}

/// Create a test app with all routes
macro_rules! tracker_app {
    ($env:expr) => {{
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.storage.clone()))
                .app_data(web::Data::new($env.tracker.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .configure(clicktrail::api::configure),
        )
        .await
    }};
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get("Location")
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn tracking_cookie(resp: &actix_web::dev::ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "hfc_clicked")
        .map(|c| c.into_owned())
}

// =============================================================================
// Logged visits
// =============================================================================

#[actix_web::test]
async fn test_first_visit_is_logged_and_redirected() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REDIRECT);

    let cookie = tracking_cookie(&resp).expect("cookie should be set");
    assert_eq!(cookie.value(), "1");
    assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(3600)));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));

    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].ip, "203.0.113.10");
    assert_eq!(clicks[0].user_agent, BROWSER_UA);
    assert_eq!(clicks[0].coordinates(), None);
}

#[actix_web::test]
async fn test_forwarded_for_is_preferred_over_peer() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr("10.0.0.2:40000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "198.51.100.7, 10.0.0.1"))
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks[0].ip, "198.51.100.7");
}

#[actix_web::test]
async fn test_missing_user_agent_and_peer() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get().uri("/saved").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].ip, "unknown");
    assert_eq!(clicks[0].user_agent, "");
}

#[actix_web::test]
async fn test_head_behaves_like_get() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/saved")
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REDIRECT);
    assert_eq!(env.storage.count_clicks().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_each_cookieless_visit_adds_a_row() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    for _ in 0..3 {
        let req = TestRequest::get()
            .uri("/saved")
            .insert_header(("User-Agent", BROWSER_UA))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    assert_eq!(env.storage.count_clicks().await.unwrap(), 3);
}

// =============================================================================
// Skipped visits
// =============================================================================

#[actix_web::test]
async fn test_cookie_visit_is_not_logged() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", BROWSER_UA))
        .cookie(Cookie::new("hfc_clicked", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REDIRECT);
    assert!(tracking_cookie(&resp).is_none());
    assert_eq!(env.storage.count_clicks().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_curl_is_not_logged() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", "curl/7.64"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REDIRECT);
    assert!(tracking_cookie(&resp).is_none());
    assert_eq!(env.storage.count_clicks().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_preview_bot_with_cookie_is_not_logged() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    for ua in [
        "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)",
        "Mozilla/5.0 (compatible; Discordbot/2.0; +https://discordapp.com)",
        "Slackbot-LinkExpanding 1.0 (+https://api.slack.com/robots)",
    ] {
        for with_cookie in [false, true] {
            let mut req = TestRequest::get()
                .uri("/saved")
                .insert_header(("User-Agent", ua));
            if with_cookie {
                req = req.cookie(Cookie::new("hfc_clicked", "1"));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
        }
    }

    assert_eq!(env.storage.count_clicks().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_extra_bot_pattern_from_config() {
    let settings = TrackingConfig {
        extra_bot_patterns: vec!["Uptime-Checker".to_string()],
        ..tracking_config()
    };
    let env = setup_with(settings, None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", "Mozilla/5.0 (X11; Linux x86_64) Uptime-Checker/1.0"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(env.storage.count_clicks().await.unwrap(), 0);
}

// =============================================================================
// Backup upload
// =============================================================================

#[actix_web::test]
async fn test_logged_visit_uploads_backup() {
    let env = setup(None).await;
    let store = Arc::new(RecordingStore::default());
    let backup = Arc::new(BackupService::new(store.clone(), env.storage.clone()));
    let tracker = Arc::new(
        ClickTracker::new(env.storage.clone(), tracking_config()).with_backup(backup),
    );
    let env = TestEnv { tracker, ..env };
    let app = tracker_app!(env);

    // 跳过的访问不触发上传
    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", BROWSER_UA))
        .cookie(Cookie::new("hfc_clicked", "1"))
        .to_request();
    test::call_service(&app, req).await;
    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", "curl/7.64"))
        .to_request();
    test::call_service(&app, req).await;

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(store.uploads().is_empty());

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    // 上传在后台任务里完成
    let mut uploads = Vec::new();
    for _ in 0..100 {
        uploads = store.uploads();
        if !uploads.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(uploads.len(), 1);
    let dump = &uploads[0];
    assert!(dump.contains("203.0.113.10"));
    assert!(dump.contains(BROWSER_UA));
    assert_eq!(dump.lines().filter(|l| l.starts_with("INSERT")).count(), 1);
}

// =============================================================================
// Geolocation
// =============================================================================

#[actix_web::test]
async fn test_resolved_coordinates_are_stored() {
    let point = GeoPoint::new(52.52, 13.405).unwrap();
    let env = setup(Some(GeoResolution::Resolved(point))).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks[0].coordinates(), Some((52.52, 13.405)));
}

#[actix_web::test]
async fn test_geolocation_timeout_still_redirects() {
    let env = setup(Some(GeoResolution::TimedOut)).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REDIRECT);
    assert!(tracking_cookie(&resp).is_some());

    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].latitude, None);
    assert_eq!(clicks[0].longitude, None);
}

#[actix_web::test]
async fn test_geolocation_failure_still_redirects() {
    let env = setup(Some(GeoResolution::Failed("HTTP status 429".to_string()))).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].coordinates(), None);
}

#[actix_web::test]
async fn test_private_ip_is_not_geolocated() {
    let point = GeoPoint::new(1.0, 1.0).unwrap();
    let env = setup(Some(GeoResolution::Resolved(point))).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .peer_addr("192.168.1.20:50000".parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    test::call_service(&app, req).await;

    let clicks = env.storage.load_clicks().await.unwrap();
    assert_eq!(clicks[0].coordinates(), None);
}

// =============================================================================
// Debug mode and failures
// =============================================================================

#[actix_web::test]
async fn test_debug_mode_does_not_persist() {
    let env = setup(Some(GeoResolution::TimedOut)).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved?debug=1")
        .peer_addr(PUBLIC_PEER.parse().unwrap())
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(tracking_cookie(&resp).is_none());
    let content_type = resp.headers().get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));

    let body = test::read_body(resp).await;
    let body = std::str::from_utf8(&body).unwrap();
    assert!(body.contains("ip: 203.0.113.10"));
    assert!(body.contains("decision: record"));
    assert!(body.contains("geolocation: not resolved (timeout)"));
    assert!(body.contains(REDIRECT));

    assert_eq!(env.storage.count_clicks().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_debug_mode_reports_bot_decision() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved?debug=1")
        .insert_header(("User-Agent", "curl/7.64"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = std::str::from_utf8(&body).unwrap();

    assert!(body.contains("decision: skip (bot: curl)"));
    assert!(body.contains("geolocation: skipped"));
}

#[actix_web::test]
async fn test_debug_flag_ignored_when_disabled() {
    let settings = TrackingConfig {
        enable_debug: false,
        ..tracking_config()
    };
    let env = setup_with(settings, None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved?debug=1")
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(env.storage.count_clicks().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_storage_failure_returns_500() {
    use sea_orm::ConnectionTrait;

    let env = setup(None).await;
    env.storage
        .get_db()
        .execute_unprepared("DROP TABLE clicks")
        .await
        .unwrap();
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(tracking_cookie(&resp).is_none());
}

#[actix_web::test]
async fn test_health_reports_click_count() {
    let env = setup(None).await;
    let app = tracker_app!(env);

    let req = TestRequest::get()
        .uri("/saved")
        .insert_header(("User-Agent", BROWSER_UA))
        .to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "sqlite");
    assert_eq!(body["storage"]["clicks"], 1);
}
