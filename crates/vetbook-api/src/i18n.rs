//! 요청 단위 로케일.
//!
//! 전역 번역 싱글턴 대신 요청마다 `Accept-Language`에서 로케일을 만들어
//! 필요한 곳에 명시적으로 전달합니다.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
};

/// 지원 로케일.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    /// 언어 태그 파싱 (`ko`, `ko-KR`, `en-US` 등). 지원하지 않으면 `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ko" => Some(Locale::Ko),
            _ => None,
        }
    }

    /// `Accept-Language` 값에서 q 가중치가 가장 높은 지원 로케일을 선택.
    ///
    /// 같은 가중치면 먼저 나온 태그가 이깁니다. 지원 태그가 없으면 기본값(en).
    pub fn from_accept_language(value: &str) -> Self {
        let mut best: Option<(Locale, f32)> = None;

        for entry in value.split(',') {
            let mut parts = entry.split(';');
            let Some(locale) = parts.next().and_then(Locale::from_tag) else {
                continue;
            };
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
                best = Some((locale, quality));
            }
        }

        best.map(|(locale, _)| locale).unwrap_or_default()
    }

    /// 요청 헤더에서 로케일 결정.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ko => "ko",
        }
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}
