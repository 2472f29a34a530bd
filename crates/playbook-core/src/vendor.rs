//! # Vendor Theming
//!
//! White-label configuration selected by the `vendor` link parameter.
//!
//! The registry is static content. A [`VendorSelection`] resolves a
//! vendor at most once; later parameters do not change it.

use crate::PlaybookError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

// =============================================================================
// VENDOR CONFIG
// =============================================================================

/// One white-label vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
}

impl VendorConfig {
    /// CSS custom properties, one declaration per line.
    #[must_use]
    pub fn css_variables(&self) -> String {
        let mut css = format!(
            "--vendor-primary: {};\n--vendor-secondary: {};\n",
            self.primary_color.to_lowercase(),
            self.secondary_color.to_lowercase()
        );
        if let Some(accent) = &self.accent_color {
            css.push_str(&format!("--vendor-accent: {};\n", accent.to_lowercase()));
        }
        css
    }

    fn validate(&self) -> Result<(), PlaybookError> {
        if self.id.trim().is_empty() {
            return Err(PlaybookError::ContentError(
                "Vendor id must be non-empty".to_string(),
            ));
        }
        let colors = [
            Some(&self.primary_color),
            Some(&self.secondary_color),
            self.accent_color.as_ref(),
        ];
        for color in colors.into_iter().flatten() {
            if !is_hex_color(color) {
                return Err(PlaybookError::ContentError(format!(
                    "Vendor '{}' has invalid colour '{}'",
                    self.id, color
                )));
            }
        }
        Ok(())
    }
}

/// `#rgb` or `#rrggbb`.
#[must_use]
pub fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Static vendor table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRegistry {
    vendors: Vec<VendorConfig>,
}

impl VendorRegistry {
    /// Build a registry, validating ids and colours.
    pub fn new(vendors: Vec<VendorConfig>) -> Result<Self, PlaybookError> {
        let mut seen = BTreeSet::new();
        for vendor in &vendors {
            vendor.validate()?;
            if !seen.insert(vendor.id.to_lowercase()) {
                return Err(PlaybookError::ContentError(format!(
                    "Duplicate vendor id '{}'",
                    vendor.id
                )));
            }
        }
        Ok(Self { vendors })
    }

    /// Case-insensitive lookup by the `vendor` parameter.
    #[must_use]
    pub fn resolve(&self, param: &str) -> Option<&VendorConfig> {
        let param = param.trim();
        self.vendors.iter().find(|v| v.id.eq_ignore_ascii_case(param))
    }

    /// All vendors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &VendorConfig> {
        self.vendors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// The vendor chosen for a session. Resolves at most once.
#[derive(Debug, Clone, Default)]
pub struct VendorSelection {
    resolved: Option<Option<VendorConfig>>,
}

impl VendorSelection {
    /// Create an unresolved selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `param` against the registry unless already resolved.
    ///
    /// The first call fixes the result, including "no vendor".
    pub fn resolve(&mut self, registry: &VendorRegistry, param: Option<&str>) -> Option<&VendorConfig> {
        if self.resolved.is_none() {
            let vendor = param.and_then(|p| registry.resolve(p)).cloned();
            match (&vendor, param) {
                (Some(v), _) => tracing::info!(vendor = %v.id, "vendor selected"),
                (None, Some(p)) => tracing::warn!(param = p, "unknown vendor, using default theme"),
                (None, None) => {}
            }
            self.resolved = Some(vendor);
        }
        self.current()
    }

    /// The selected vendor, if any.
    #[must_use]
    pub fn current(&self) -> Option<&VendorConfig> {
        self.resolved.as_ref().and_then(Option::as_ref)
    }
}

// =============================================================================
// LINK PARAMETERS
// =============================================================================

/// Deep-link parameters understood by the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParams {
    pub vendor: Option<String>,
    pub role: Option<String>,
    pub selected: Option<String>,
    /// FAQ or glossary anchor, without `#`.
    pub fragment: Option<String>,
}

impl LinkParams {
    /// Parse a query string (leading `?` optional) and a fragment
    /// (leading `#` optional). Unknown parameters are ignored; the first
    /// occurrence of a repeated parameter wins. Empty values count as absent.
    #[must_use]
    pub fn parse(query: &str, fragment: Option<&str>) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "vendor" => &mut params.vendor,
                "role" => &mut params.role,
                "selected" => &mut params.selected,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        params.fragment = fragment
            .map(|f| f.strip_prefix('#').unwrap_or(f).trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        params
    }

    /// Parse the parameters of a full link.
    pub fn from_url(link: &str) -> Result<Self, PlaybookError> {
        let url = Url::parse(link)
            .map_err(|e| PlaybookError::InvalidInput(format!("Invalid link '{}': {}", link, e)))?;
        Ok(Self::parse(url.query().unwrap_or(""), url.fragment()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(id: &str, primary: &str) -> VendorConfig {
        VendorConfig {
            id: id.to_string(),
            name: id.to_uppercase(),
            logo_url: None,
            primary_color: primary.to_string(),
            secondary_color: "#FFFFFF".to_string(),
            accent_color: None,
            contact_email: None,
            tagline: None,
        }
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#1A2b3C"));
        assert!(!is_hex_color("1a2b3c"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#ggg"));
    }

    #[test]
    fn registry_rejects_bad_colour() {
        assert!(VendorRegistry::new(vec![vendor("acme", "red")]).is_err());
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let result = VendorRegistry::new(vec![vendor("acme", "#000"), vendor("ACME", "#111")]);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = VendorRegistry::new(vec![vendor("acme", "#112233")]).expect("registry");
        assert_eq!(registry.resolve("AcMe").map(|v| v.id.as_str()), Some("acme"));
        assert!(registry.resolve("globex").is_none());
    }

    #[test]
    fn css_variables_lines() {
        let css = vendor("acme", "#AABBCC").css_variables();
        assert_eq!(css, "--vendor-primary: #aabbcc;\n--vendor-secondary: #ffffff;\n");
    }

    #[test]
    fn selection_is_fixed_after_first_resolve() {
        let registry = VendorRegistry::new(vec![vendor("acme", "#000"), vendor("globex", "#111")])
            .expect("registry");
        let mut selection = VendorSelection::new();

        assert_eq!(
            selection.resolve(&registry, Some("acme")).map(|v| v.id.clone()),
            Some("acme".to_string())
        );
        assert_eq!(
            selection.resolve(&registry, Some("globex")).map(|v| v.id.clone()),
            Some("acme".to_string())
        );
    }

    #[test]
    fn unknown_vendor_resolves_to_none_once() {
        let registry = VendorRegistry::new(vec![vendor("acme", "#000")]).expect("registry");
        let mut selection = VendorSelection::new();

        assert!(selection.resolve(&registry, Some("nobody")).is_none());
        assert!(selection.resolve(&registry, Some("acme")).is_none());
        assert!(selection.current().is_none());
    }

    #[test]
    fn link_params_decode() {
        let params = LinkParams::parse(
            "?vendor=acme&role=audit%20committee&selected=board+pack&x=1",
            Some("#material-control"),
        );
        assert_eq!(params.vendor.as_deref(), Some("acme"));
        assert_eq!(params.role.as_deref(), Some("audit committee"));
        assert_eq!(params.selected.as_deref(), Some("board pack"));
        assert_eq!(params.fragment.as_deref(), Some("material-control"));
    }

    #[test]
    fn link_params_ignore_empty_and_repeats() {
        let params = LinkParams::parse("vendor=&role=cfo&role=board", None);
        assert!(params.vendor.is_none());
        assert_eq!(params.role.as_deref(), Some("cfo"));
        assert!(params.fragment.is_none());
    }

    #[test]
    fn link_params_from_url() {
        let params = LinkParams::from_url("https://p29.example/faq?vendor=acme#scope").expect("parse");
        assert_eq!(params.vendor.as_deref(), Some("acme"));
        assert_eq!(params.fragment.as_deref(), Some("scope"));
        assert!(LinkParams::from_url("not a url").is_err());
    }
}
