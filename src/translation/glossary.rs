/*!
 * User glossaries.
 *
 * A glossary is a flat JSON object mapping a source term to its preferred
 * rendering. There is one default glossary (`dictionary.json`) and optional
 * per-language overrides (`dictionary-<lang>.json`). Keys are lower-cased on
 * load and matched case-insensitively against source strings.
 */

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::language_utils::normalize_language_code;

/// File name of the language-agnostic glossary
pub const DEFAULT_GLOSSARY_FILE: &str = "dictionary.json";

/// File name of the glossary for `lang`, or the default one
pub fn glossary_file_name(lang: Option<&str>) -> String {
    match lang.map(normalize_language_code) {
        Some(code) if !code.is_empty() => format!("dictionary-{}.json", code),
        _ => DEFAULT_GLOSSARY_FILE.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: IndexMap<String, String>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a glossary from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: IndexMap<String, String> =
            serde_json::from_str(content).context("Glossary must be a JSON object of strings")?;
        let mut glossary = Self::new();
        for (term, rendering) in raw {
            glossary.add(term, rendering);
        }
        Ok(glossary)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {:?}", path))?;
        Self::from_json_str(&content).with_context(|| format!("Invalid glossary file: {:?}", path))
    }

    /// Load the glossary for `lang` from `dir`
    ///
    /// The per-language file replaces the default one when it exists; a
    /// missing default file yields an empty glossary.
    pub fn load_for_language(dir: &Path, lang: &str) -> Result<Self> {
        let specific = dir.join(glossary_file_name(Some(lang)));
        if specific.is_file() {
            debug!("Using glossary {:?}", specific);
            return Self::load(specific);
        }

        let default = dir.join(DEFAULT_GLOSSARY_FILE);
        if default.is_file() {
            debug!("Using glossary {:?}", default);
            return Self::load(default);
        }
        Ok(Self::new())
    }

    /// Add a term, lower-casing its key
    pub fn add(&mut self, term: impl AsRef<str>, rendering: impl Into<String>) {
        let key = term.as_ref().to_lowercase();
        if !key.is_empty() {
            self.terms.insert(key, rendering.into());
        }
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.terms.get(&term.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Terms that occur in any of `texts`, in glossary order
    pub fn matching_terms<'a, I>(&self, texts: I) -> Vec<(&str, &str)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lowered: Vec<String> = texts.into_iter().map(str::to_lowercase).collect();
        self.iter()
            .filter(|(term, _)| lowered.iter().any(|text| text.contains(term)))
            .collect()
    }
}

/// Path of the glossary file for `lang` inside `dir`
pub fn glossary_path(dir: &Path, lang: Option<&str>) -> PathBuf {
    dir.join(glossary_file_name(lang))
}
