/*!
 * Predicate-based entry removal.
 *
 * Every enabled option is an independent predicate; an entry is removed as
 * soon as any one of them matches.
 */

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::errors::CatalogError;

use super::model::{Catalog, Entry};

/// Which entries to remove. All options default to off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    pub fuzzy: bool,
    pub obsolete: bool,
    pub untranslated: bool,
    pub translated: bool,
    pub translated_not_fuzzy: bool,
    pub fuzzy_translated: bool,
    /// Substring of the reference comment, or `/pattern/flags` for a regex
    pub reference_contains: Option<String>,
}

impl RemoveOptions {
    /// Whether no predicate is enabled
    pub fn is_empty(&self) -> bool {
        !(self.fuzzy
            || self.obsolete
            || self.untranslated
            || self.translated
            || self.translated_not_fuzzy
            || self.fuzzy_translated
            || self.reference_contains.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// How the reference comment is matched
#[derive(Debug, Clone)]
pub enum ReferenceMatcher {
    Substring(String),
    Pattern(Regex),
}

impl ReferenceMatcher {
    /// Parse `/pattern/flags` into a regex, anything else is a plain substring.
    ///
    /// Recognized flags: `i` (case-insensitive), `m` (multi-line), `s` (dot
    /// matches newline). `g`, `u` and `y` are accepted and ignored.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let Some((pattern, flags)) = split_regex_literal(raw) else {
            return Ok(Self::Substring(raw.to_string()));
        };

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                _ => {}
            }
        }

        builder
            .build()
            .map(Self::Pattern)
            .map_err(|e| CatalogError::InvalidPattern(e.to_string()))
    }

    pub fn is_match(&self, reference: &str) -> bool {
        match self {
            Self::Substring(needle) => reference.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(reference),
        }
    }
}

/// Split `/pattern/flags`; the pattern may not contain `/`
fn split_regex_literal(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix('/')?;
    let end = rest.find('/')?;
    let (pattern, flags) = (&rest[..end], &rest[end + 1..]);
    if pattern.is_empty() {
        return None;
    }
    let flag_len = flags
        .find(|c: char| !matches!(c, 'i' | 'g' | 'm' | 's' | 'u' | 'y'))
        .unwrap_or(flags.len());
    Some((pattern, &flags[..flag_len]))
}

/// Compiled removal predicates
#[derive(Debug, Clone)]
pub struct EntryFilter {
    options: RemoveOptions,
    reference: Option<ReferenceMatcher>,
}

impl EntryFilter {
    pub fn new(options: &RemoveOptions) -> Result<Self, CatalogError> {
        let reference = match options.reference_contains.as_deref() {
            Some(raw) if !raw.is_empty() => Some(ReferenceMatcher::parse(raw)?),
            _ => None,
        };
        Ok(Self {
            options: options.clone(),
            reference,
        })
    }

    /// Whether any enabled predicate matches the entry
    ///
    /// `#~` entries are only selected by the obsolete predicate.
    pub fn matches(&self, entry: &Entry) -> bool {
        let options = &self.options;
        if entry.obsolete {
            return options.obsolete;
        }

        let fuzzy = entry.is_fuzzy();
        let translated = entry.is_translated();

        (options.fuzzy && fuzzy)
            || (options.obsolete && entry.has_flag("obsolete"))
            || (options.untranslated && !translated)
            || (options.translated && translated)
            || (options.translated_not_fuzzy && translated && !fuzzy)
            || (options.fuzzy_translated && translated && fuzzy)
            || self
                .reference
                .as_ref()
                .is_some_and(|matcher| matcher.is_match(&entry.comments.reference))
    }

    /// Remove every matching entry, returning how many were removed
    pub fn apply(&self, catalog: &mut Catalog) -> usize {
        let mut removed = 0;
        for entries in catalog.contexts.values_mut() {
            let before = entries.len();
            entries.retain(|_, entry| entry.is_header() || !self.matches(entry));
            removed += before - entries.len();
        }
        debug!("Removed {} entries", removed);
        removed
    }
}

/// Remove entries matching any enabled option and return the catalog
pub fn remove_by_options(mut catalog: Catalog, options: &RemoveOptions) -> Result<Catalog, CatalogError> {
    EntryFilter::new(options)?.apply(&mut catalog);
    Ok(catalog)
}
