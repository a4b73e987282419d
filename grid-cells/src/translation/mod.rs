//! Message translation
//!
//! The resolver only needs [`TranslationService::translate`]; [`MessageCatalog`]
//! is a file-backed implementation keyed by locale.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Message key of the label shown for `true` booleans
pub const TRUE_MESSAGE: &str = "commons.true";
/// Message key of the label shown for `false` booleans
pub const FALSE_MESSAGE: &str = "commons.false";

/// A locale tag such as `en` or `pl-PL`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language part of the tag (`pl` for `pl-PL`), if it has a region
    pub fn language(&self) -> Option<&str> {
        self.0
            .split_once(['-', '_'])
            .map(|(language, _)| language)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en")
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves message keys to localized text
///
/// Shared by every resolution running at the same time, so implementations
/// must be safe for concurrent reads.
pub trait TranslationService: Send + Sync {
    fn translate(&self, key: &str, locale: &Locale) -> String;
}

/// Messages per locale, loaded from TOML:
///
/// ```toml
/// [en]
/// "commons.true" = "Yes"
/// "orders.order.state.value.done" = "Done"
///
/// [pl]
/// "commons.true" = "Tak"
/// ```
///
/// Lookups fall back from `pl-PL` to `pl`; an unknown key translates to
/// itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    messages: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message, replacing any previous one
    pub fn insert(
        &mut self,
        locale: &Locale,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.messages
            .entry(locale.as_str().to_string())
            .or_default()
            .insert(key.into(), message.into());
    }

    /// Builder-style [`MessageCatalog::insert`]
    pub fn with(mut self, locale: &Locale, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.insert(locale, key, message);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse message catalog")
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message catalog: {}", path.display()))?;
        let catalog = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid message catalog: {}", path.display()))?;

        log::debug!(
            "Loaded {} locales from {}",
            catalog.messages.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Look up a message without falling back to the key
    pub fn message(&self, key: &str, locale: &Locale) -> Option<&str> {
        let lookup = |tag: &str| {
            self.messages
                .get(tag)
                .and_then(|messages| messages.get(key))
                .map(String::as_str)
        };

        lookup(locale.as_str()).or_else(|| locale.language().and_then(lookup))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}

impl TranslationService for MessageCatalog {
    fn translate(&self, key: &str, locale: &Locale) -> String {
        match self.message(key, locale) {
            Some(message) => message.to_string(),
            None => {
                log::trace!("No message for '{}' in locale {}", key, locale);
                key.to_string()
            }
        }
    }
}
