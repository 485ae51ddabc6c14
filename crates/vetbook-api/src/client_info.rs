//! 요청에서 클라이언트 정보 추출.
//!
//! 클라이언트 IP는 소켓 피어 주소가 기준입니다. 전달 헤더
//! (`X-Forwarded-For`, `X-Real-IP`)는 피어가 신뢰 프록시 목록에 있을 때만 읽습니다.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, Extensions, HeaderMap},
};
use vetbook_core::DeviceInfo;

/// 전달 헤더를 믿어도 되는 리버스 프록시 주소 목록.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    pub fn new(proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(proxies.into_iter().collect())
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    /// 실제 클라이언트 IP 결정.
    ///
    /// 피어가 신뢰 프록시가 아니면 피어 주소 그대로입니다. 신뢰 프록시라면
    /// `X-Forwarded-For`를 오른쪽부터 읽어 처음 만나는 신뢰하지 않는 주소를,
    /// 없으면 `X-Real-IP`를 사용합니다. 피어를 모르면 `None`.
    pub fn client_ip(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> Option<IpAddr> {
        let peer = peer?;
        if !self.contains(&peer) {
            return Some(peer);
        }

        let forwarded: Vec<IpAddr> = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|ip| ip.trim().parse().ok())
            .collect();

        let from_chain = forwarded
            .iter()
            .rev()
            .find(|ip| !self.contains(ip))
            .or_else(|| forwarded.first())
            .copied();

        from_chain
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
            })
            .or(Some(peer))
    }
}

/// `into_make_service_with_connect_info`로 서비스할 때 주입되는 피어 주소.
pub fn peer_addr(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// 핸들러용 클라이언트 IP 추출기. 피어 주소를 모르면 `None`.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trusted = TrustedProxies::from_ref(state);
        Ok(ClientIp(
            trusted.client_ip(peer_addr(&parts.extensions), &parts.headers),
        ))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 엣지 지오로케이션 헤더에서 (국가, 도시) 추출.
///
/// Vercel 헤더를 우선하고 국가는 Cloudflare 헤더로 보완합니다.
/// 도시 이름은 퍼센트 인코딩되어 전달됩니다.
pub fn extract_location(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let country = header_str(headers, "x-vercel-ip-country")
        .or_else(|| header_str(headers, "cf-ipcountry"))
        // Cloudflare는 알 수 없는 국가를 XX, Tor를 T1로 표시
        .filter(|c| c != "XX" && c != "T1");

    let city = header_str(headers, "x-vercel-ip-city").map(|raw| {
        urlencoding::decode(&raw)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(raw)
    });

    (country, city)
}

/// 로그인 요청의 기기 메타데이터 수집.
pub fn device_info(headers: &HeaderMap, client_ip: Option<IpAddr>) -> DeviceInfo {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let (country, city) = extract_location(headers);

    DeviceInfo::from_user_agent(user_agent)
        .with_ip(client_ip.map(|ip| ip.to_string()))
        .with_location(country, city)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarding_headers() {
        let trusted = TrustedProxies::new([ip("10.0.0.1")]);
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("x-real-ip", "198.51.100.2"),
        ]);

        assert_eq!(trusted.client_ip(Some(ip("192.0.2.50")), &h), Some(ip("192.0.2.50")));
        assert_eq!(TrustedProxies::default().client_ip(Some(ip("10.0.0.1")), &h), Some(ip("10.0.0.1")));
        assert_eq!(trusted.client_ip(None, &h), None);
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_untrusted_hop() {
        let trusted = TrustedProxies::new([ip("10.0.0.1"), ip("10.0.0.2")]);

        // 클라이언트가 위조한 왼쪽 항목은 무시
        let h = headers(&[("x-forwarded-for", "1.2.3.4, 203.0.113.7, 10.0.0.2")]);
        assert_eq!(trusted.client_ip(Some(ip("10.0.0.1")), &h), Some(ip("203.0.113.7")));

        let h = headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(trusted.client_ip(Some(ip("10.0.0.1")), &h), Some(ip("198.51.100.2")));

        assert_eq!(
            trusted.client_ip(Some(ip("10.0.0.1")), &HeaderMap::new()),
            Some(ip("10.0.0.1"))
        );
    }

    #[test]
    fn test_peer_addr_reads_connect_info() {
        let mut extensions = Extensions::new();
        assert_eq!(peer_addr(&extensions), None);

        extensions.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 50], 51000))));
        assert_eq!(peer_addr(&extensions), Some(ip("192.0.2.50")));
    }

    #[test]
    fn test_location_headers() {
        let h = headers(&[("x-vercel-ip-country", "KR"), ("x-vercel-ip-city", "Seoul%20Teukbyeolsi")]);
        assert_eq!(
            extract_location(&h),
            (Some("KR".to_string()), Some("Seoul Teukbyeolsi".to_string()))
        );

        let h = headers(&[("cf-ipcountry", "DE")]);
        assert_eq!(extract_location(&h), (Some("DE".to_string()), None));

        let h = headers(&[("cf-ipcountry", "XX")]);
        assert_eq!(extract_location(&h), (None, None));
    }

    #[test]
    fn test_device_info_collects_everything() {
        let h = headers(&[
            (
                "user-agent",
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
            ),
            ("x-vercel-ip-country", "US"),
        ]);

        let info = device_info(&h, Some(ip("198.51.100.2")));
        assert_eq!(info.device.as_deref(), Some("mobile"));
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.os.as_deref(), Some("iOS"));
        assert_eq!(info.ip_address.as_deref(), Some("198.51.100.2"));
        assert_eq!(info.country.as_deref(), Some("US"));
        assert_eq!(info.city, None);
    }

    #[test]
    fn test_empty_headers_give_empty_device() {
        assert_eq!(device_info(&HeaderMap::new(), None), DeviceInfo::default());
    }
}
