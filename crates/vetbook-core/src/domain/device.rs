//! 세션 기기 메타데이터.

use serde::{Deserialize, Serialize};

/// 로그인 요청에서 수집한 기기 정보. 모든 필드는 선택적입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// "mobile" | "tablet" | "desktop"
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl DeviceInfo {
    /// User-Agent 문자열에서 기기 종류, 브라우저, OS를 분류합니다.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.trim().is_empty() {
            return Self::default();
        }

        Self {
            device: Some(device_kind(&ua).to_string()),
            browser: browser_name(&ua).map(str::to_string),
            os: os_name(&ua).map(str::to_string),
            ..Default::default()
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_location(mut self, country: Option<String>, city: Option<String>) -> Self {
        self.country = country;
        self.city = city;
        self
    }
}

fn device_kind(ua: &str) -> &'static str {
    if ua.contains("ipad") || ua.contains("tablet") || (ua.contains("android") && !ua.contains("mobile")) {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("iphone") {
        "mobile"
    } else {
        "desktop"
    }
}

// 순서 중요: Edge/Opera UA에는 "chrome"이, Chrome UA에는 "safari"가 포함됨
fn browser_name(ua: &str) -> Option<&'static str> {
    if ua.contains("edg/") || ua.contains("edge/") {
        Some("Edge")
    } else if ua.contains("opr/") || ua.contains("opera") {
        Some("Opera")
    } else if ua.contains("samsungbrowser") {
        Some("Samsung Internet")
    } else if ua.contains("firefox/") || ua.contains("fxios") {
        Some("Firefox")
    } else if ua.contains("chrome/") || ua.contains("crios") {
        Some("Chrome")
    } else if ua.contains("safari/") {
        Some("Safari")
    } else {
        None
    }
}

fn os_name(ua: &str) -> Option<&'static str> {
    if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        Some("iOS")
    } else if ua.contains("android") {
        Some("Android")
    } else if ua.contains("windows") {
        Some("Windows")
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        Some("macOS")
    } else if ua.contains("linux") {
        Some("Linux")
    } else {
        None
    }
}
