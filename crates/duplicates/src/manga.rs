use crate::title::{clean_title, description_alt_titles};
use serde::{Deserialize, Serialize};

/// The parts of a library entry that duplicate detection looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "altTitles")]
    pub alternative_titles: Vec<String>,
}

impl Manga {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            alternative_titles: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alternative_titles(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.alternative_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Cleaned forms of the title, the explicit alternative titles and the
    /// ones listed in the description. Deduplicated, main title first.
    pub fn cleaned_titles(&self) -> Vec<String> {
        let from_description = self.description.as_deref().map(description_alt_titles).unwrap_or_default();
        let mut titles: Vec<String> = Vec::new();
        let all = std::iter::once(&self.title).chain(&self.alternative_titles).chain(&from_description);
        for cleaned in all.map(|title| clean_title(title)) {
            if !titles.contains(&cleaned) {
                titles.push(cleaned);
            }
        }
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_titles_merge_every_source() {
        let manga = Manga::new(1, "Solo Leveling")
            .with_alternative_titles(["Na Honjaman Level Up", "solo leveling!"])
            .with_description("Alt Titles: Only I Level Up");
        assert_eq!(manga.cleaned_titles(), vec!["solo leveling", "na honjaman level up", "only i level up"]);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let manga: Manga = serde_json::from_str(r#"{"id": 3, "title": "Berserk", "altTitles": ["ベルセルク"]}"#).unwrap();
        assert_eq!(manga.description, None);
        assert_eq!(manga.alternative_titles, vec!["ベルセルク"]);
    }
}
