//! IP 地址处理工具
//!
//! 客户端 IP 提取顺序：
//! 1. X-Forwarded-For 的第一个值
//! 2. X-Real-IP
//! 3. 连接对端地址（仅 IP 部分）
//! 4. `"unknown"`

use std::net::IpAddr;

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 无法确定来源时记录的占位值
pub const UNKNOWN_IP: &str = "unknown";

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 字符串形式的 IP 是否值得做地理定位
///
/// 无法解析的值（包括 `unknown`）也返回 false。
pub fn is_routable(ip: &str) -> bool {
    ip.parse::<IpAddr>()
        .map(|addr| !is_private_or_local(&addr))
        .unwrap_or(false)
}

/// 从 HttpRequest 提取客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> String {
    extract_forwarded_ip_from_headers(req.headers())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// 从 HeaderMap 提取转发的 IP
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    // 优先 X-Forwarded-For（取第一个，即原始客户端 IP）
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_is_private_or_local_ipv4() {
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"169.254.10.1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(&"1.1.1.1".parse().unwrap()));
    }

    #[test]
    fn test_is_private_or_local_ipv6() {
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(is_private_or_local(&"fc00::1".parse().unwrap()));
        assert!(is_private_or_local(&"fe80::1".parse().unwrap()));
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_is_routable() {
        assert!(is_routable("8.8.8.8"));
        assert!(!is_routable("127.0.0.1"));
        assert!(!is_routable(UNKNOWN_IP));
        assert!(!is_routable("8.8.8.8:443"));
    }

    #[test]
    fn test_forwarded_for_takes_first_token() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", " 203.0.113.7 , 10.0.0.2"))
            .insert_header(("X-Real-IP", "198.51.100.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "198.51.100.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "198.51.100.1");
    }

    #[test]
    fn test_peer_addr_fallback() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.10:52100".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "192.0.2.10");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), UNKNOWN_IP);
    }
}
