// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

const SUPPORTED: [&str; 2] = ["pt", "en"];

// Idioma das mensagens de erro, lido do Accept-Language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// "pt-BR,en;q=0.8" -> "pt". Idiomas sem catálogo caem no português.
    pub fn from_header(value: &str) -> Self {
        accept_language::parse(value)
            .iter()
            .filter_map(|tag| tag.split('-').next())
            .map(str::to_lowercase)
            .find(|lang| SUPPORTED.contains(&lang.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();
        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header("pt-BR,en;q=0.8").0, "pt");
        assert_eq!(Locale::from_header("fr-FR,en-US;q=0.7").0, "en");
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        assert_eq!(Locale::from_header("de").0, "pt");
        assert_eq!(Locale::from_header("").0, "pt");
    }
}
