//! Header resolution: raw column labels to canonical output column names.
//!
//! A [`HeaderMap`] carries the definition-level header configuration for one
//! recipe: a static translation table (raw label -> canonical label, identity
//! when absent), a pre-declared header list for formats that carry no
//! discoverable headers, and an optional case-style normalization applied to
//! labels without an explicit translation.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::handlers::RecipeError;

/// Case convention applied to untranslated raw labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    Pascal,
    Camel,
    Snake,
    Kebab,
    Title,
    Upper,
    Lower,
}

impl CaseStyle {
    fn as_case(self) -> Case {
        match self {
            CaseStyle::Pascal => Case::Pascal,
            CaseStyle::Camel => Case::Camel,
            CaseStyle::Snake => Case::Snake,
            CaseStyle::Kebab => Case::Kebab,
            CaseStyle::Title => Case::Title,
            CaseStyle::Upper => Case::Upper,
            CaseStyle::Lower => Case::Lower,
        }
    }
}

/// Definition-level header configuration for a recipe.
///
/// Built either fluently in code or from a declarative YAML string:
///
/// ```yaml
/// translations:
///   Имя: Name
///   Возраст: Age
/// prepared: [One, Two, Three]
/// case: pascal
/// ```
///
/// Resolution precedence for a raw label: explicit translation, then case
/// normalization (if configured), then identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMap {
    /// Raw label -> canonical label.
    #[serde(default)]
    translations: IndexMap<String, String>,

    /// Fixed header list used when the recipe discovers no raw headers.
    #[serde(default)]
    prepared: Vec<String>,

    /// Case convention for labels with no explicit translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    case: Option<CaseStyle>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one raw -> canonical translation.
    pub fn with_translation(
        mut self,
        raw: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.translations.insert(raw.into(), canonical.into());
        self
    }

    /// Set the pre-declared header list.
    pub fn with_prepared<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prepared = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Normalize untranslated labels to the given case convention.
    pub fn with_case(mut self, style: CaseStyle) -> Self {
        self.case = Some(style);
        self
    }

    /// Load a header map from a declarative YAML string.
    ///
    /// File reading stays with the caller; the engine only sees strings.
    pub fn from_yaml(yaml: &str) -> Result<Self, RecipeError> {
        serde_yaml::from_str(yaml).map_err(|e| RecipeError::InvalidHeaderMap(e.to_string()))
    }

    /// Resolve one raw label to its canonical header.
    pub fn resolve(&self, raw: &str) -> String {
        if let Some(canonical) = self.translations.get(raw) {
            return canonical.clone();
        }
        match self.case {
            Some(style) => raw.to_case(style.as_case()),
            None => raw.to_string(),
        }
    }

    /// The pre-declared header list.
    pub fn prepared(&self) -> &[String] {
        &self.prepared
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty() && self.prepared.is_empty() && self.case.is_none()
    }
}
