//! Fingerprint profile pool
//!
//! A fixed catalog of client identities and the selection rules used to turn
//! a profile into the concrete fingerprint presented for one fetch attempt.

mod profiles;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

const FALLBACK_VIEWPORT: (u32, u32) = (1920, 1080);
const FALLBACK_LANGUAGE: &str = "en-US,en;q=0.9";
const FALLBACK_TIMEZONE: &str = "UTC";

/// Device class advertised by a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// One catalog entry. Pure data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintProfile {
    pub user_agent: &'static str,
    pub device_class: DeviceClass,
    pub viewports: &'static [(u32, u32)],
    pub accept_languages: &'static [&'static str],
    pub timezones: &'static [&'static str],
}

/// Browser window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Viewport {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// The identity actually presented during one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFingerprint {
    pub user_agent: String,
    pub device_class: DeviceClass,
    pub viewport: Viewport,
    pub accept_language: String,
    /// Primary language tag of `accept_language`
    pub locale: String,
    pub timezone: String,
    /// Browser engine name, filled in by the fetch layer
    pub engine: String,
}

impl ActiveFingerprint {
    fn assemble(
        profile: &FingerprintProfile,
        viewport: (u32, u32),
        accept_language: &str,
        timezone: &str,
    ) -> Self {
        let locale = accept_language
            .split(',')
            .next()
            .unwrap_or(accept_language)
            .to_string();

        Self {
            user_agent: profile.user_agent.to_string(),
            device_class: profile.device_class,
            viewport: viewport.into(),
            accept_language: accept_language.to_string(),
            locale,
            timezone: timezone.to_string(),
            engine: String::new(),
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Selection over a static set of profiles
#[derive(Debug, Clone, Copy)]
pub struct FingerprintPool {
    profiles: &'static [FingerprintProfile],
}

impl Default for FingerprintPool {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintPool {
    /// Pool over the built-in catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: profiles::PROFILES,
        }
    }

    /// Pool over a caller-supplied catalog
    ///
    /// An empty catalog falls back to the built-in one.
    #[must_use]
    pub fn with_profiles(profiles: &'static [FingerprintProfile]) -> Self {
        if profiles.is_empty() {
            return Self::new();
        }
        Self { profiles }
    }

    #[must_use]
    pub fn profiles(&self) -> &'static [FingerprintProfile] {
        self.profiles
    }

    /// First profile with the first viewport, language and timezone
    #[must_use]
    pub fn deterministic(&self) -> ActiveFingerprint {
        let profile = self.profiles.first().unwrap_or(&profiles::BASELINE);
        ActiveFingerprint::assemble(
            profile,
            profile.viewports.first().copied().unwrap_or(FALLBACK_VIEWPORT),
            profile.accept_languages.first().copied().unwrap_or(FALLBACK_LANGUAGE),
            profile.timezones.first().copied().unwrap_or(FALLBACK_TIMEZONE),
        )
    }

    /// Baseline fingerprint for a run
    ///
    /// `user_agent_override` only applies to the deterministic baseline; a
    /// random profile keeps its own agent so device class and viewport stay
    /// consistent with it.
    pub fn baseline<R: Rng + ?Sized>(
        &self,
        randomize: bool,
        user_agent_override: Option<&str>,
        rng: &mut R,
    ) -> ActiveFingerprint {
        if randomize {
            return self.random(rng);
        }
        let fingerprint = self.deterministic();
        match user_agent_override {
            Some(user_agent) => fingerprint.with_user_agent(user_agent),
            None => fingerprint,
        }
    }

    /// Uniformly random profile, viewport, language and timezone
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> ActiveFingerprint {
        match self.profiles.choose(rng) {
            Some(profile) => Self::materialize(profile, rng),
            None => self.deterministic(),
        }
    }

    /// Random fingerprint whose user agent differs from `previous_user_agent`
    ///
    /// Returns `None` when every profile shares that user agent.
    pub fn random_distinct_from<R: Rng + ?Sized>(
        &self,
        previous_user_agent: &str,
        rng: &mut R,
    ) -> Option<ActiveFingerprint> {
        let candidates: Vec<&FingerprintProfile> = self
            .profiles
            .iter()
            .filter(|profile| profile.user_agent != previous_user_agent)
            .collect();

        candidates
            .choose(rng)
            .map(|profile| Self::materialize(profile, rng))
    }

    fn materialize<R: Rng + ?Sized>(
        profile: &FingerprintProfile,
        rng: &mut R,
    ) -> ActiveFingerprint {
        let viewport = profile
            .viewports
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_VIEWPORT);
        let language = profile
            .accept_languages
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_LANGUAGE);
        let timezone = profile
            .timezones
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_TIMEZONE);

        ActiveFingerprint::assemble(profile, viewport, language, timezone)
    }
}

/// Log the fingerprint a run starts with
pub fn log_summary(fingerprint: &ActiveFingerprint, headless: bool) {
    info!(
        user_agent = %fingerprint.user_agent,
        device = ?fingerprint.device_class,
        accept_language = %fingerprint.accept_language,
        locale = %fingerprint.locale,
        timezone = %fingerprint.timezone,
        viewport = ?(fingerprint.viewport.width, fingerprint.viewport.height),
        engine = %fingerprint.engine,
        headless,
        "Baseline fingerprint"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_selection_stays_inside_its_profile() {
        let pool = FingerprintPool::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..64 {
            let fp = pool.random(&mut rng);
            let profile = pool
                .profiles()
                .iter()
                .find(|p| p.user_agent == fp.user_agent)
                .expect("user agent comes from the catalog");
            assert_eq!(profile.device_class, fp.device_class);
            assert!(profile
                .viewports
                .contains(&(fp.viewport.width, fp.viewport.height)));
            assert!(profile.accept_languages.contains(&fp.accept_language.as_str()));
            assert!(profile.timezones.contains(&fp.timezone.as_str()));
            assert!(fp.accept_language.starts_with(&fp.locale));
        }
    }

    #[test]
    fn deterministic_uses_first_entries() {
        let pool = FingerprintPool::new();
        let fp = pool.deterministic();
        let first = &pool.profiles()[0];
        assert_eq!(fp.user_agent, first.user_agent);
        assert_eq!(fp.locale, "en-US");
        assert_eq!(fp.timezone, "UTC");
        assert_eq!(fp.viewport, Viewport { width: 1920, height: 1080 });
    }

    #[test]
    fn distinct_selection_never_repeats_user_agent() {
        let pool = FingerprintPool::new();
        let mut rng = StdRng::seed_from_u64(42);
        let previous = pool.profiles()[1].user_agent;

        for _ in 0..32 {
            let fp = pool.random_distinct_from(previous, &mut rng).unwrap();
            assert_ne!(fp.user_agent, previous);
        }
    }

    #[test]
    fn deterministic_tolerates_empty_profile_lists() {
        static SPARSE: &[FingerprintProfile] = &[FingerprintProfile {
            user_agent: "sparse-agent",
            device_class: DeviceClass::Desktop,
            viewports: &[],
            accept_languages: &[],
            timezones: &[],
        }];
        let fp = FingerprintPool::with_profiles(SPARSE).deterministic();
        assert_eq!(fp.user_agent, "sparse-agent");
        assert_eq!(fp.viewport, Viewport { width: 1920, height: 1080 });
        assert_eq!(fp.locale, "en-US");
        assert_eq!(fp.timezone, "UTC");
    }

    #[test]
    fn user_agent_override_applies_only_to_deterministic_baseline() {
        let pool = FingerprintPool::new();
        let mut rng = StdRng::seed_from_u64(3);

        let fixed = pool.baseline(false, Some("custom-agent/1.0"), &mut rng);
        assert_eq!(fixed.user_agent, "custom-agent/1.0");
        assert_eq!(fixed.viewport, pool.deterministic().viewport);

        for _ in 0..32 {
            let random = pool.baseline(true, Some("custom-agent/1.0"), &mut rng);
            assert_ne!(random.user_agent, "custom-agent/1.0");
            assert!(pool.profiles().iter().any(|p| p.user_agent == random.user_agent));
        }
    }

    #[test]
    fn distinct_selection_is_none_for_single_profile_pool() {
        static SINGLE: &[FingerprintProfile] = &[FingerprintProfile {
            user_agent: "solo-agent",
            device_class: DeviceClass::Desktop,
            viewports: &[(800, 600)],
            accept_languages: &["en-US"],
            timezones: &["UTC"],
        }];
        let pool = FingerprintPool::with_profiles(SINGLE);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pool.random_distinct_from("solo-agent", &mut rng).is_none());
    }
}
