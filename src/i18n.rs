//! # Localised Status Labels
//!
//! The numeric core never depends on localisation. Components report a
//! [`ThermalLabel`]; callers that want display text pass a [`Localizer`]
//! explicitly. A missing translator or missing key degrades to the raw key.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Primary,
    Secondary,
}

/// Lookup capability backed by whatever store the host provides
#[cfg_attr(test, mockall::automock)]
pub trait Translator {
    fn translate(&self, key: &str, language: Language) -> Option<String>;
}

/// Translations bundled with the crate: English as the primary language,
/// Russian as the secondary one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTranslations;

static BUILTIN: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        ("standard", ("Standard", "Норма")),
        ("warm", ("Warm", "Тепло")),
        ("overheating", ("Overheating", "Перегрев")),
        ("criticalOverheating", ("Critical overheating", "Критический перегрев")),
        ("criticallyCold", ("Critically cold", "Критически холодно")),
        ("veryCold", ("Very cold", "Очень холодно")),
        ("cold", ("Cold", "Холодно")),
        ("optimal", ("Optimal", "Оптимально")),
        ("hot", ("Hot", "Жарко")),
        ("criticallyHot", ("Critically hot", "Критически жарко")),
    ])
});

impl Translator for StaticTranslations {
    fn translate(&self, key: &str, language: Language) -> Option<String> {
        BUILTIN.get(key).map(|(primary, secondary)| match language {
            Language::Primary => primary.to_string(),
            Language::Secondary => secondary.to_string(),
        })
    }
}

/// Explicit localisation context handed to whoever wants label text
#[derive(Clone, Copy)]
pub struct Localizer<'a> {
    translator: Option<&'a dyn Translator>,
    language: Language,
}

impl<'a> Localizer<'a> {
    pub fn new(translator: &'a dyn Translator, language: Language) -> Self {
        Self {
            translator: Some(translator),
            language,
        }
    }

    /// Context without a backing store; every lookup returns the key.
    pub fn untranslated() -> Self {
        Self {
            translator: None,
            language: Language::Primary,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self, key: &str) -> String {
        self.translator
            .and_then(|t| t.translate(key, self.language))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| key.to_string())
    }
}

impl std::fmt::Debug for Localizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("has_translator", &self.translator.is_some())
            .field("language", &self.language)
            .finish()
    }
}

/// Thermal state of a component, as a translation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, EnumIter)]
pub enum ThermalLabel {
    #[strum(serialize = "standard")]
    Standard,
    #[strum(serialize = "warm")]
    Warm,
    #[strum(serialize = "overheating")]
    Overheating,
    #[strum(serialize = "criticalOverheating")]
    CriticalOverheating,
    #[strum(serialize = "criticallyCold")]
    CriticallyCold,
    #[strum(serialize = "veryCold")]
    VeryCold,
    #[strum(serialize = "cold")]
    Cold,
    #[strum(serialize = "optimal")]
    Optimal,
    #[strum(serialize = "hot")]
    Hot,
    #[strum(serialize = "criticallyHot")]
    CriticallyHot,
}

impl ThermalLabel {
    pub fn key(&self) -> &'static str {
        self.into()
    }

    pub fn localized(&self, localizer: &Localizer<'_>) -> String {
        localizer.text(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{eq, function};
    use strum::IntoEnumIterator;

    #[test]
    fn test_builtin_covers_every_label() {
        let translations = StaticTranslations;
        for label in ThermalLabel::iter() {
            assert!(
                translations.translate(label.key(), Language::Primary).is_some(),
                "missing translation for {}",
                label.key()
            );
        }
    }

    #[test]
    fn test_builtin_languages() {
        let localizer = Localizer::new(&StaticTranslations, Language::Secondary);
        assert_eq!(ThermalLabel::Warm.localized(&localizer), "Тепло");

        let localizer = Localizer::new(&StaticTranslations, Language::Primary);
        assert_eq!(ThermalLabel::Warm.localized(&localizer), "Warm");
    }

    #[test]
    fn test_untranslated_returns_key() {
        let localizer = Localizer::untranslated();
        assert_eq!(
            ThermalLabel::CriticalOverheating.localized(&localizer),
            "criticalOverheating"
        );
    }

    #[test]
    fn test_missing_translation_degrades_to_key() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .with(function(|key: &str| key == "hot"), eq(Language::Secondary))
            .times(1)
            .returning(|_, _| None);

        let localizer = Localizer::new(&translator, Language::Secondary);
        assert_eq!(ThermalLabel::Hot.localized(&localizer), "hot");
    }

    #[test]
    fn test_empty_translation_degrades_to_key() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|_, _| Some(String::new()));

        let localizer = Localizer::new(&translator, Language::Primary);
        assert_eq!(ThermalLabel::Cold.localized(&localizer), "cold");
    }
}
