//! # Preferences
//!
//! Cookie consent, analytics opt-out and demo-mode flags. Each lives
//! under its own storage key.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A recorded cookie consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieConsent {
    pub analytics: bool,
    pub marketing: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub decided_at: OffsetDateTime,
}

/// Consent state. `None` until the banner is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentState(Option<CookieConsent>);

impl ConsentState {
    /// Record a decision, replacing any earlier one.
    pub fn set(&mut self, analytics: bool, marketing: bool, now: OffsetDateTime) {
        self.0 = Some(CookieConsent {
            analytics,
            marketing,
            decided_at: now,
        });
    }

    #[must_use]
    pub fn decision(&self) -> Option<&CookieConsent> {
        self.0.as_ref()
    }

    /// Whether the consent banner still needs an answer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.is_none()
    }

    /// Withdraw the decision.
    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Explicit analytics opt-out, independent of consent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticsOptOut(pub bool);

/// Analytics runs only with consent and without an opt-out.
#[must_use]
pub fn analytics_enabled(consent: &ConsentState, opt_out: AnalyticsOptOut) -> bool {
    !opt_out.0 && consent.decision().is_some_and(|c| c.analytics)
}

/// Demo-mode flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoMode {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub intro_seen: bool,
}

impl DemoMode {
    /// Whether the demo intro should be shown.
    #[must_use]
    pub fn show_intro(&self) -> bool {
        self.enabled && !self.intro_seen
    }
}
