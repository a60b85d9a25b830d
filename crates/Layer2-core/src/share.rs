//! Share links - 인코딩된 페이로드를 URL에 싣고 꺼내기
//!
//! 페이로드는 쿼리 파라미터(`?chain=...`)에 들어갑니다.
//! 꺼낼 때는 쿼리를 먼저 보고, 없으면 `#chain=...` 프래그먼트를 봅니다.

use linesmith_foundation::{Error, Result, ShareSettings};
use url::Url;

/// 공유 링크 생성
pub fn share_link(settings: &ShareSettings, payload: &str) -> Result<String> {
    let mut url = Url::parse(&settings.base_url)
        .map_err(|e| Error::Config(format!("Invalid share base URL '{}': {}", settings.base_url, e)))?;

    // 같은 이름의 기존 파라미터는 교체
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != settings.param.as_str())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(&settings.param, payload);

    Ok(url.to_string())
}

/// 링크에서 페이로드 추출 (없으면 `None`)
///
/// 전체 URL이 아니면 (`?chain=...`, `#chain=...`, 맨 페이로드 등) `None`
pub fn payload_from_link(link: &str, param: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;

    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == param)
        .map(|(_, v)| v.into_owned());
    if let Some(payload) = from_query.filter(|p| !p.is_empty()) {
        return Some(payload);
    }

    let fragment = url.fragment()?;
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(k, _)| k == param)
        .map(|(_, v)| v.into_owned())
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ShareSettings {
        ShareSettings::default()
    }

    #[test]
    fn test_link_round_trip() {
        let payload = "eyJ2ZXJzaW9uIjoyfQ";
        let link = share_link(&settings(), payload).unwrap();
        assert!(link.starts_with("https://linesmith.local/?chain="));
        assert_eq!(payload_from_link(&link, "chain").as_deref(), Some(payload));
    }

    #[test]
    fn test_standard_base64_survives_query_encoding() {
        let payload = "eyJh+Ijo/fQ==";
        let link = share_link(&settings(), payload).unwrap();
        assert!(!link.contains('+'));
        assert_eq!(payload_from_link(&link, "chain").as_deref(), Some(payload));
    }

    #[test]
    fn test_replaces_existing_param() {
        let s = ShareSettings {
            base_url: "https://example.com/app?lang=en&chain=old".to_string(),
            param: "chain".to_string(),
        };
        let link = share_link(&s, "new").unwrap();
        assert_eq!(link, "https://example.com/app?lang=en&chain=new");
    }

    #[test]
    fn test_fragment_link() {
        let link = "https://example.com/#chain=abc123";
        assert_eq!(payload_from_link(link, "chain").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_payload() {
        assert_eq!(payload_from_link("https://example.com/?x=1", "chain"), None);
        assert_eq!(payload_from_link("not a url", "chain"), None);
    }

    #[test]
    fn test_invalid_base_url() {
        let s = ShareSettings {
            base_url: "::nope".to_string(),
            param: "chain".to_string(),
        };
        assert!(matches!(share_link(&s, "x"), Err(Error::Config(_))));
    }
}
