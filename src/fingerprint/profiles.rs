//! Static catalog of plausible client identities
//!
//! Every combination a profile can produce must be internally consistent:
//! a mobile user agent only ships phone-sized viewports and so on.

use super::{DeviceClass, FingerprintProfile};

/// First catalog entry and the fallback for an empty caller catalog
pub(crate) const BASELINE: FingerprintProfile = FingerprintProfile {
    user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
    device_class: DeviceClass::Desktop,
    viewports: &[
        (1920, 1080),
        (1536, 864),
        (1440, 900),
        (1366, 768),
        (1280, 800),
        (2560, 1440),
    ],
    accept_languages: &["en-US,en;q=0.9", "de-DE,de,en;q=0.8", "fr-FR,fr,en;q=0.8"],
    timezones: &["UTC", "Europe/Berlin", "America/New_York", "Asia/Singapore"],
};

pub(crate) static PROFILES: &[FingerprintProfile] = &[
    BASELINE,
    FingerprintProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        device_class: DeviceClass::Desktop,
        viewports: &[(1920, 1080), (1728, 1117), (1512, 982), (1440, 900), (1280, 800)],
        accept_languages: &["en-US,en;q=0.9", "fr-FR,fr,en;q=0.8"],
        timezones: &["UTC", "Europe/Paris", "America/New_York"],
    },
    FingerprintProfile {
        user_agent: "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
        device_class: DeviceClass::Desktop,
        viewports: &[(1920, 1080), (1680, 1050), (1600, 900), (1366, 768), (1440, 900)],
        accept_languages: &["en-US,en;q=0.9", "de-DE,de,en;q=0.8"],
        timezones: &["UTC", "Europe/Berlin", "America/Chicago"],
    },
    FingerprintProfile {
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
        device_class: DeviceClass::Mobile,
        viewports: &[(375, 812), (390, 844), (414, 896)],
        accept_languages: &["en-US,en;q=0.9"],
        timezones: &["UTC", "America/Los_Angeles", "Europe/London"],
    },
];
