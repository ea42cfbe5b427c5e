use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Picks the best supported locale for an `Accept-Language` header.
pub type LocaleSelector = fn(Option<&str>, &[String]) -> Option<String>;

/// Localization extension: supported languages, message catalogs and the
/// locale selector.
#[derive(Clone)]
pub struct Localizer {
    languages: Vec<String>,
    catalogs: HashMap<String, HashMap<String, String>>,
    selector: LocaleSelector,
}

impl Localizer {
    pub fn new(languages: Vec<String>, selector: LocaleSelector) -> Self {
        Self {
            languages,
            catalogs: HashMap::new(),
            selector,
        }
    }

    /// Loads `<dir>/<lang>.json` catalogs for the supported languages.
    /// Languages without a catalog file fall back to the message ids.
    pub async fn load(
        languages: Vec<String>,
        dir: &Path,
        selector: LocaleSelector,
    ) -> Result<Self, LocalizationError> {
        let mut localizer = Self::new(languages, selector);

        for language in localizer.languages.clone() {
            let path = dir.join(format!("{}.json", language));
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(LocalizationError::Io { path, source }),
            };
            let catalog: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|source| LocalizationError::Parse {
                    path: path.clone(),
                    source,
                })?;

            tracing::debug!("Loaded {} translations for {}", catalog.len(), language);
            localizer.catalogs.insert(language, catalog);
        }

        Ok(localizer)
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn default_locale(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or("en")
    }

    pub fn has_catalog(&self, language: &str) -> bool {
        self.catalogs.contains_key(language)
    }

    /// Locale for a request, falling back to the default locale.
    pub fn locale_for(&self, accept_language: Option<&str>) -> String {
        (self.selector)(accept_language, &self.languages)
            .unwrap_or_else(|| self.default_locale().to_string())
    }

    pub fn gettext(&self, locale: &str, msgid: &str) -> String {
        self.catalogs
            .get(locale)
            .and_then(|catalog| catalog.get(msgid))
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }
}

/// Message translated when rendered rather than when declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LazyText(&'static str);

pub const fn lazy_gettext(msgid: &'static str) -> LazyText {
    LazyText(msgid)
}

impl LazyText {
    pub fn msgid(&self) -> &'static str {
        self.0
    }

    pub fn resolve(&self, localizer: &Localizer, locale: &str) -> String {
        localizer.gettext(locale, self.0)
    }
}

/// Default locale selector.
///
/// Language ranges are tried by descending quality (`q=0` never matches).
/// An exact tag match wins; otherwise the first range whose primary subtag
/// matches a supported language is used. `*` picks the first language.
pub fn select_locale(accept_language: Option<&str>, languages: &[String]) -> Option<String> {
    let ranges = parse_accept_language(accept_language?);

    for (range, _) in &ranges {
        if range == "*" {
            return languages.first().cloned();
        }
        if let Some(language) = languages.iter().find(|l| normalize(l) == *range) {
            return Some(language.clone());
        }
    }

    for (range, _) in &ranges {
        let primary = primary_subtag(range);
        if let Some(language) = languages
            .iter()
            .find(|l| primary_subtag(&normalize(l)) == primary)
        {
            return Some(language.clone());
        }
    }

    None
}

/// Returns `(normalized range, quality)` pairs, best first.
fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut ranges: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let range = normalize(parts.next()?.trim());
            if range.is_empty() {
                return None;
            }
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            Some((range, quality))
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    // Stable sort keeps header order among equal qualities
    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranges
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

#[derive(Debug, thiserror::Error)]
pub enum LocalizationError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let languages = langs(&["en", "es"]);
        assert_eq!(
            select_locale(Some("es,en;q=0.8"), &languages),
            Some("es".to_string())
        );
    }

    #[test]
    fn test_quality_ordering() {
        let languages = langs(&["en", "es"]);
        assert_eq!(
            select_locale(Some("en;q=0.3, es;q=0.9"), &languages),
            Some("es".to_string())
        );
    }

    #[test]
    fn test_region_falls_back_to_primary_language() {
        let languages = langs(&["en", "es"]);
        assert_eq!(
            select_locale(Some("es-MX, fr;q=0.5"), &languages),
            Some("es".to_string())
        );
    }

    #[test]
    fn test_zero_quality_is_ignored() {
        let languages = langs(&["en", "es"]);
        assert_eq!(select_locale(Some("es;q=0, de"), &languages), None);
    }

    #[test]
    fn test_wildcard_and_missing_header() {
        let languages = langs(&["en", "es"]);
        assert_eq!(select_locale(Some("*"), &languages), Some("en".to_string()));
        assert_eq!(select_locale(None, &languages), None);
    }

    #[test]
    fn test_locale_for_falls_back_to_default() {
        let localizer = Localizer::new(langs(&["es", "en"]), select_locale);

        assert_eq!(localizer.locale_for(Some("de")), "es");
        assert_eq!(localizer.locale_for(Some("en-GB")), "en");
    }

    #[tokio::test]
    async fn test_load_catalogs_and_translate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("es.json"),
            r#"{"Please log in to access this page.": "Por favor ingrese para acceder a esta página."}"#,
        )
        .unwrap();

        let localizer = Localizer::load(langs(&["en", "es"]), dir.path(), select_locale)
            .await
            .unwrap();
        let message = lazy_gettext("Please log in to access this page.");

        assert!(localizer.has_catalog("es"));
        assert!(!localizer.has_catalog("en"));
        assert_eq!(
            message.resolve(&localizer, "es"),
            "Por favor ingrese para acceder a esta página."
        );
        assert_eq!(
            message.resolve(&localizer, "en"),
            "Please log in to access this page."
        );
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), "not json").unwrap();

        let result = Localizer::load(langs(&["en"]), dir.path(), select_locale).await;
        assert!(matches!(result, Err(LocalizationError::Parse { .. })));
    }
}
