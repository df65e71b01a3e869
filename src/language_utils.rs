use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Language utilities for catalog language codes
///
/// Catalog codes come from `Language` headers and the command line, so they
/// may carry regions (`pt_BR`, `zh-Hant`) and stray whitespace.
static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\W+").expect("Invalid non-word regex")
});

/// Normalize a language code for glossary lookup and prompts
///
/// Lower-cases, trims, and collapses every run of non-word characters into a
/// single `-`: `" pt_BR "` stays `"pt_br"`, `"zh Hant"` becomes `"zh-hant"`.
pub fn normalize_language_code(code: &str) -> String {
    let lowered = code.trim().to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, "-").into_owned()
}

/// The primary subtag of a normalized code (`"pt_br"` -> `"pt"`)
pub fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Look up the ISO language for a code, ignoring any region suffix
pub fn lookup_language(code: &str) -> Option<Language> {
    let normalized = normalize_language_code(code);
    let primary = primary_subtag(&normalized);
    match primary.len() {
        2 => Language::from_639_1(primary),
        3 => Language::from_639_3(primary),
        _ => None,
    }
}

/// English display name of a language code, falling back to the code itself
pub fn language_display_name(code: &str) -> String {
    match lookup_language(code) {
        Some(language) => language.to_name().to_string(),
        None => code.trim().to_string(),
    }
}

/// Check if two language codes name the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup_language(code1), lookup_language(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => normalize_language_code(code1) == normalize_language_code(code2),
    }
}
