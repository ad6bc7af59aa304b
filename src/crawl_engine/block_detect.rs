//! Anti-bot interstitial detection
//!
//! A plain case-insensitive substring check against known challenge and
//! denial markers. Cheap, and deliberately conservative: a false positive
//! only costs one extra attempt.

use crate::utils::constants::BLOCK_SIGNATURES;

/// Whether `html` looks like a challenge or denial page
#[must_use]
pub fn is_blocked(html: &str) -> bool {
    first_signature(html).is_some()
}

/// The first signature found in `html`, if any
#[must_use]
pub fn first_signature(html: &str) -> Option<&'static str> {
    if html.is_empty() {
        return None;
    }
    let lowered = html.to_lowercase();
    BLOCK_SIGNATURES
        .iter()
        .copied()
        .find(|signature| lowered.contains(signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cloudflare_challenge_case_insensitively() {
        let html = "<html><title>Attention Required! | Cloudflare</title></html>";
        assert!(is_blocked(html));
        assert_eq!(first_signature(html), Some("attention required! | cloudflare"));
    }

    #[test]
    fn detects_captcha_widget() {
        assert!(is_blocked(r#"<div class="G-RECAPTCHA" data-sitekey="x"></div>"#));
    }

    #[test]
    fn ordinary_page_is_not_blocked() {
        assert!(!is_blocked("<html><body><h1>Prices</h1><p>9.99</p></body></html>"));
        assert!(!is_blocked(""));
    }

    #[test]
    fn signatures_are_lowercase() {
        for signature in BLOCK_SIGNATURES {
            assert_eq!(*signature, signature.to_lowercase());
        }
    }
}
