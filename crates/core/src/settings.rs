//! CMS site settings schema.
//!
//! Marketing copy is edited by operators without a deploy. Instead of an open
//! key/value bag, the editable fields are a closed set of [`SettingKey`]s, each
//! with a category, a default, and a validation rule. Stored rows carry
//! [`SETTINGS_SCHEMA_VERSION`] so a later schema change can tell old rows apart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Email;

/// Version written alongside every stored setting.
pub const SETTINGS_SCHEMA_VERSION: i32 = 1;

/// Grouping used by the admin UI to load one panel at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingCategory {
    Hero,
    Promo,
    Contact,
    Seo,
    Footer,
}

impl SettingCategory {
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::Promo,
        Self::Contact,
        Self::Seo,
        Self::Footer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Promo => "promo",
            Self::Contact => "contact",
            Self::Seo => "seo",
            Self::Footer => "footer",
        }
    }
}

impl std::str::FromStr for SettingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown settings category: {s}"))
    }
}

/// How a field's value is checked before it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    Text { max_len: usize, required: bool },
    Email,
    Url,
    Phone,
    Flag,
}

impl FieldRule {
    fn check(self, value: &str) -> Result<(), String> {
        match self {
            Self::Text { max_len, required } => {
                if required && value.trim().is_empty() {
                    return Err("value is required".to_owned());
                }
                let len = value.chars().count();
                if len > max_len {
                    return Err(format!("must be at most {max_len} characters (got {len})"));
                }
                Ok(())
            }
            Self::Email => Email::parse(value).map(|_| ()).map_err(|e| e.to_string()),
            Self::Url => match url::Url::parse(value) {
                Ok(u) if matches!(u.scheme(), "http" | "https") && u.host().is_some() => Ok(()),
                _ => Err("must be an absolute http(s) URL".to_owned()),
            },
            Self::Phone => {
                let allowed = value
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
                let digits = value.chars().filter(char::is_ascii_digit).count();
                if allowed && (7..=15).contains(&digits) {
                    Ok(())
                } else {
                    Err("must be a phone number with 7 to 15 digits".to_owned())
                }
            }
            Self::Flag => match value {
                "true" | "false" => Ok(()),
                _ => Err("must be \"true\" or \"false\"".to_owned()),
            },
        }
    }
}

/// Every editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    HeroTitle,
    HeroSubtitle,
    HeroCtaText,
    HeroImageUrl,
    PromoEnabled,
    PromoBannerText,
    ContactEmail,
    ContactPhone,
    SupportHours,
    SeoTitle,
    SeoDescription,
    FooterTagline,
    FooterCopyright,
}

impl SettingKey {
    pub const ALL: [Self; 13] = [
        Self::HeroTitle,
        Self::HeroSubtitle,
        Self::HeroCtaText,
        Self::HeroImageUrl,
        Self::PromoEnabled,
        Self::PromoBannerText,
        Self::ContactEmail,
        Self::ContactPhone,
        Self::SupportHours,
        Self::SeoTitle,
        Self::SeoDescription,
        Self::FooterTagline,
        Self::FooterCopyright,
    ];

    /// Stored key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeroTitle => "hero_title",
            Self::HeroSubtitle => "hero_subtitle",
            Self::HeroCtaText => "hero_cta_text",
            Self::HeroImageUrl => "hero_image_url",
            Self::PromoEnabled => "promo_enabled",
            Self::PromoBannerText => "promo_banner_text",
            Self::ContactEmail => "contact_email",
            Self::ContactPhone => "contact_phone",
            Self::SupportHours => "support_hours",
            Self::SeoTitle => "seo_title",
            Self::SeoDescription => "seo_description",
            Self::FooterTagline => "footer_tagline",
            Self::FooterCopyright => "footer_copyright",
        }
    }

    #[must_use]
    pub const fn category(self) -> SettingCategory {
        match self {
            Self::HeroTitle | Self::HeroSubtitle | Self::HeroCtaText | Self::HeroImageUrl => {
                SettingCategory::Hero
            }
            Self::PromoEnabled | Self::PromoBannerText => SettingCategory::Promo,
            Self::ContactEmail | Self::ContactPhone | Self::SupportHours => {
                SettingCategory::Contact
            }
            Self::SeoTitle | Self::SeoDescription => SettingCategory::Seo,
            Self::FooterTagline | Self::FooterCopyright => SettingCategory::Footer,
        }
    }

    /// Value used when no row exists for the key.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::HeroTitle => "Stream Everything. Pay Less.",
            Self::HeroSubtitle => {
                "Pre-configured Fire Sticks and IPTV plans with thousands of live channels."
            }
            Self::HeroCtaText => "Shop Now",
            Self::HeroImageUrl => "https://streamstickpro.com/images/hero.webp",
            Self::PromoEnabled => "false",
            Self::PromoBannerText => "",
            Self::ContactEmail => "support@streamstickpro.com",
            Self::ContactPhone => "+1 (555) 010-2030",
            Self::SupportHours => "Mon-Sun, 9am-9pm ET",
            Self::SeoTitle => "StreamStick Pro | Fire Sticks & IPTV",
            Self::SeoDescription => {
                "Pre-configured, ready-to-stream Fire Sticks and IPTV subscriptions with fast support."
            }
            Self::FooterTagline => "Streaming made simple.",
            Self::FooterCopyright => "StreamStick Pro. All rights reserved.",
        }
    }

    #[must_use]
    pub const fn rule(self) -> FieldRule {
        match self {
            Self::HeroTitle => FieldRule::Text {
                max_len: 120,
                required: true,
            },
            Self::HeroSubtitle | Self::FooterTagline => FieldRule::Text {
                max_len: 300,
                required: false,
            },
            Self::HeroCtaText => FieldRule::Text {
                max_len: 40,
                required: true,
            },
            Self::HeroImageUrl => FieldRule::Url,
            Self::PromoEnabled => FieldRule::Flag,
            Self::PromoBannerText => FieldRule::Text {
                max_len: 160,
                required: false,
            },
            Self::ContactEmail => FieldRule::Email,
            Self::ContactPhone => FieldRule::Phone,
            Self::SupportHours => FieldRule::Text {
                max_len: 80,
                required: false,
            },
            Self::SeoTitle => FieldRule::Text {
                max_len: 70,
                required: true,
            },
            Self::SeoDescription => FieldRule::Text {
                max_len: 160,
                required: false,
            },
            Self::FooterCopyright => FieldRule::Text {
                max_len: 120,
                required: false,
            },
        }
    }

    /// Keys belonging to `category`.
    pub fn in_category(category: SettingCategory) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |k| k.category() == category)
    }
}

impl std::str::FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown setting key: {s}"))
    }
}

/// A row as read from the settings table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StoredSetting {
    pub key: String,
    pub value: String,
}

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub key: SettingKey,
    pub message: String,
}

/// Editable settings for a set of categories, with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsForm {
    values: BTreeMap<SettingKey, String>,
}

impl SettingsForm {
    /// A form holding the default value of every key in `categories`.
    #[must_use]
    pub fn with_defaults(categories: &[SettingCategory]) -> Self {
        let values = SettingKey::ALL
            .into_iter()
            .filter(|k| categories.contains(&k.category()))
            .map(|k| (k, k.default_value().to_owned()))
            .collect();
        Self { values }
    }

    /// Flatten stored rows over the defaults for `categories`.
    ///
    /// Returns the form and the stored keys that were skipped because the
    /// schema does not know them.
    #[must_use]
    pub fn from_rows(
        categories: &[SettingCategory],
        rows: impl IntoIterator<Item = StoredSetting>,
    ) -> (Self, Vec<String>) {
        let mut form = Self::with_defaults(categories);
        let mut unknown = Vec::new();
        for row in rows {
            match row.key.parse::<SettingKey>() {
                Ok(key) if categories.contains(&key.category()) => {
                    form.values.insert(key, row.value);
                }
                Ok(_) => {}
                Err(_) => unknown.push(row.key),
            }
        }
        (form, unknown)
    }

    #[must_use]
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check every field against its rule.
    ///
    /// # Errors
    ///
    /// Returns all failing fields, not just the first.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .values
            .iter()
            .filter_map(|(key, value)| {
                key.rule().check(value).err().map(|message| FieldError {
                    key: *key,
                    message,
                })
            })
            .collect();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// A setting that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFailure {
    pub key: SettingKey,
    pub error: String,
}

/// Per-key outcome of saving a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: Vec<SettingKey>,
    pub failed: Vec<SaveFailure>,
}

impl SaveReport {
    /// Whether every field was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_passes_its_rule() {
        let form = SettingsForm::with_defaults(&SettingCategory::ALL);
        assert_eq!(form.len(), SettingKey::ALL.len());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_from_rows_overrides_defaults_and_reports_unknown() {
        let rows = vec![
            StoredSetting {
                key: "hero_title".to_owned(),
                value: "Cut the cord".to_owned(),
            },
            StoredSetting {
                key: "seo_title".to_owned(),
                value: "ignored: not a requested category".to_owned(),
            },
            StoredSetting {
                key: "legacy_banner".to_owned(),
                value: "x".to_owned(),
            },
        ];
        let (form, unknown) = SettingsForm::from_rows(&[SettingCategory::Hero], rows);

        assert_eq!(form.get(SettingKey::HeroTitle), Some("Cut the cord"));
        assert_eq!(
            form.get(SettingKey::HeroCtaText),
            Some(SettingKey::HeroCtaText.default_value())
        );
        assert_eq!(form.get(SettingKey::SeoTitle), None);
        assert_eq!(unknown, vec!["legacy_banner".to_owned()]);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut form = SettingsForm::with_defaults(&SettingCategory::ALL);
        form.set(SettingKey::HeroTitle, "");
        form.set(SettingKey::ContactEmail, "not-an-email");
        form.set(SettingKey::PromoEnabled, "yes");
        form.set(SettingKey::HeroImageUrl, "ftp://x");
        form.set(SettingKey::ContactPhone, "call me");
        form.set(SettingKey::SeoTitle, "t".repeat(71));

        let errors = form.validate().unwrap_err();
        let keys: Vec<SettingKey> = errors.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![
                SettingKey::HeroTitle,
                SettingKey::HeroImageUrl,
                SettingKey::PromoEnabled,
                SettingKey::ContactEmail,
                SettingKey::ContactPhone,
                SettingKey::SeoTitle,
            ]
        );
    }

    #[test]
    fn test_url_rule_requires_parseable_http_url() {
        for ok in [
            "https://streamstickpro.com/images/hero.webp",
            "http://cdn.example.com:8080/a?b=c",
        ] {
            assert!(FieldRule::Url.check(ok).is_ok(), "{ok}");
        }
        for bad in [
            "https://[",
            "http://exa%mple.com:99999999/",
            "https://<script>",
            "ftp://files.example.com/x",
            "mailto:ops@example.com",
            "/images/hero.webp",
            "",
        ] {
            assert!(FieldRule::Url.check(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_form_deserializes_from_key_map() {
        let form: SettingsForm =
            serde_json::from_str(r#"{"hero_title":"A","promo_enabled":"true"}"#).unwrap();
        assert_eq!(form.get(SettingKey::HeroTitle), Some("A"));
        assert!(serde_json::from_str::<SettingsForm>(r#"{"bogus":"x"}"#).is_err());
    }
}
