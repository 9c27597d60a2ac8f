//! Localized messages for plugin output.
//!
//! Messages are templates with positional placeholders (`{0}`, `{1}`, ...),
//! grouped by language tag. Tags are compared loosely, so `zh_CN`, `zh-CN`
//! and `ZH-cn` name the same catalog.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Captures, Regex};

use crate::error::{SdkError, SdkResult};

/// Language used when nothing else is configured or found.
pub const DEFAULT_LANGUAGE: &str = "zh_CN";

/// Environment variable carrying the worker's locale.
pub const LOCALE_ENV: &str = "BK_CI_LOCALE_LANGUAGE";

const FILE_PREFIX: &str = "message_";
const FILE_SUFFIX: &str = ".properties";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"));

/// Locale requested by the worker, `zh_CN` if unset.
pub fn runtime_language() -> String {
    std::env::var(LOCALE_ENV)
        .ok()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

/// Substitute `{N}` with the N-th parameter. Out-of-range placeholders stay.
pub fn format_message(template: &str, params: &[&dyn Display]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| params.get(i))
                .map_or_else(|| caps[0].to_string(), ToString::to_string)
        })
        .into_owned()
}

/// Message templates for every known language.
#[derive(Debug)]
pub struct Catalog {
    messages: HashMap<String, HashMap<String, String>>,
    current: RwLock<String>,
}

impl Catalog {
    /// Empty catalog with `language` active.
    pub fn new(language: &str) -> Self {
        Self { messages: HashMap::new(), current: RwLock::new(normalize(language)) }
    }

    /// Build a catalog from `(language, messages)` pairs and activate
    /// `language`. Blank language tags are skipped with a warning.
    pub fn from_translations<I, L, M, K, V>(translations: I, language: &str) -> Self
    where
        I: IntoIterator<Item = (L, M)>,
        L: AsRef<str>,
        M: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::new(DEFAULT_LANGUAGE);
        for (tag, messages) in translations {
            let tag = tag.as_ref();
            if tag.trim().is_empty() {
                tracing::warn!("skip translations with empty language tag");
                continue;
            }
            catalog.add_messages(tag, messages);
        }
        catalog.change_language(language);
        catalog
    }

    /// [`Catalog::from_translations`] with the worker's locale active.
    pub fn for_runtime<I, L, M, K, V>(translations: I) -> Self
    where
        I: IntoIterator<Item = (L, M)>,
        L: AsRef<str>,
        M: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_translations(translations, &runtime_language())
    }

    /// Add templates for a language.
    pub fn add_messages<I, K, V>(&mut self, language: &str, messages: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.messages
            .entry(normalize(language))
            .or_default()
            .extend(messages.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Load every `message_<lang>.properties` file in `dir`.
    pub fn load_dir(dir: &Path, language: &str) -> SdkResult<Self> {
        let mut catalog = Self::new(language);
        let entries = std::fs::read_dir(dir).map_err(|e| SdkError::io(dir, e))?;

        for entry in entries {
            let path = entry.map_err(|e| SdkError::io(dir, e))?.path();
            let Some(lang) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
                .map(str::to_string)
            else {
                continue;
            };

            let content = std::fs::read_to_string(&path).map_err(|e| SdkError::io(&path, e))?;
            catalog.add_messages(&lang, parse_properties(&content));
        }

        Ok(catalog)
    }

    /// Switch the active language.
    pub fn change_language(&self, language: &str) {
        let language = normalize(language);
        if *self.current.read() == language {
            return;
        }
        *self.current.write() = language;
    }

    pub fn current_language(&self) -> String {
        self.current.read().clone()
    }

    /// Render message `id` in the active language.
    ///
    /// Falls back to the default language when the active one lacks the
    /// catalog or the message.
    pub fn localize(&self, id: &str, params: &[&dyn Display]) -> SdkResult<String> {
        let current = self.current.read();
        let default = normalize(DEFAULT_LANGUAGE);

        let active = self.messages.get(current.as_str()).or_else(|| self.messages.get(&default));
        let Some(active) = active else {
            return Err(SdkError::Localize(
                "no current internationalization language found".to_string(),
            ));
        };

        let template = active
            .get(id)
            .or_else(|| self.messages.get(&default).and_then(|m| m.get(id)))
            .ok_or_else(|| SdkError::Localize(format!("message \"{id}\" not found")))?;

        Ok(format_message(template, params))
    }
}

/// `key=value` lines; `#` and `!` start comments.
fn parse_properties(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}
