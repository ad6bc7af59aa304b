use serde::Serialize;

use crate::fingerprint::{ActiveFingerprint, DeviceClass};

/// Values the evasion scripts read from `window.__ghostConfig`
///
/// Derived entirely from the attempt's fingerprint, so the page sees one
/// consistent identity across headers, navigator and screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StealthConfig {
    pub accept_language: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
    pub max_touch_points: u32,
    pub session_seed: String,
}

impl StealthConfig {
    #[must_use]
    pub fn from_fingerprint(fingerprint: &ActiveFingerprint, session_seed: String) -> Self {
        let platform = platform_for(&fingerprint.user_agent);
        let (webgl_vendor, webgl_renderer) = match platform {
            "MacIntel" | "iPhone" => ("Apple Inc.", "Apple GPU"),
            _ => ("Intel Inc.", "Intel(R) UHD Graphics"),
        };
        let mobile = fingerprint.device_class == DeviceClass::Mobile;

        Self {
            accept_language: fingerprint.accept_language.clone(),
            platform: platform.to_string(),
            language: fingerprint.locale.clone(),
            languages: languages_from_header(&fingerprint.accept_language),
            screen_width: fingerprint.viewport.width,
            screen_height: fingerprint.viewport.height,
            webgl_vendor: webgl_vendor.to_string(),
            webgl_renderer: webgl_renderer.to_string(),
            hardware_concurrency: if mobile { 6 } else { 8 },
            max_touch_points: if mobile { 5 } else { 0 },
            session_seed,
        }
    }
}

/// `navigator.platform` matching a user agent string
fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("iPhone") {
        "iPhone"
    } else if user_agent.contains("Macintosh") {
        "MacIntel"
    } else if user_agent.contains("Linux") {
        "Linux x86_64"
    } else {
        "Win32"
    }
}

/// Language tags of an Accept-Language header, quality values stripped
fn languages_from_header(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintPool;

    #[test]
    fn derives_languages_without_quality_values() {
        assert_eq!(
            languages_from_header("de-DE,de,en;q=0.8"),
            vec!["de-DE", "de", "en"]
        );
    }

    #[test]
    fn platform_follows_user_agent() {
        let pool = FingerprintPool::new();
        let platforms: Vec<String> = pool
            .profiles()
            .iter()
            .map(|profile| {
                let fp = pool.deterministic().with_user_agent(profile.user_agent);
                StealthConfig::from_fingerprint(&fp, String::new()).platform
            })
            .collect();
        assert_eq!(platforms, vec!["Win32", "MacIntel", "Linux x86_64", "iPhone"]);
    }

    #[test]
    fn screen_matches_viewport() {
        let fp = FingerprintPool::new().deterministic();
        let config = StealthConfig::from_fingerprint(&fp, "00".into());
        assert_eq!((config.screen_width, config.screen_height), (1920, 1080));
        assert_eq!(config.language, "en-US");
        assert_eq!(config.max_touch_points, 0);
    }
}
