use crate::{feed::FeedQuery, models::Repository, Result};
use ghexplorer_api::{SearchParams, SortKey, SortOrder};
use serde::{Deserialize, Serialize};

/// Trait for search providers - makes testing easier and keeps things flexible
///
/// The feed only ever sees this trait, so tests can hand it a mock instead
/// of the real GitHub client.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch a single page. One attempt, no retries.
    async fn search(&self, params: &SearchParams) -> Result<Vec<Repository>>;
}

/// Languages offered by the search filter panel
pub const POPULAR_LANGUAGES: &[&str] = &[
    "all", "JavaScript", "TypeScript", "Python", "Java", "Go", "Rust", "C++", "C#", "PHP", "Ruby",
    "Swift", "Kotlin", "Dart", "Vue", "React",
];

/// Search page filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: String,
    /// `None` means every language
    pub language: Option<String>,
    pub min_stars: u32,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            query: String::new(),
            language: None,
            min_stars: 0,
            sort: SortKey::Stars,
            order: SortOrder::Desc,
        }
    }
}

impl SearchFilters {
    /// True when there is nothing to search for
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Compose GitHub's `q` parameter from the free text and qualifiers
    pub fn build_query(&self) -> String {
        let mut parts = vec![self.query.trim().to_string()];

        if let Some(lang) = &self.language {
            let lang = lang.trim();
            if !lang.is_empty() && !lang.eq_ignore_ascii_case("all") {
                parts.push(format!("language:{}", lang));
            }
        }

        if self.min_stars > 0 {
            parts.push(format!("stars:>={}", self.min_stars));
        }

        parts.join(" ")
    }

    /// Step through the language list, wrapping back to "all"
    pub fn cycle_language(&mut self) {
        let current = self.language.as_deref().unwrap_or("all");
        let idx = POPULAR_LANGUAGES
            .iter()
            .position(|l| l.eq_ignore_ascii_case(current))
            .unwrap_or(0);
        let next = POPULAR_LANGUAGES[(idx + 1) % POPULAR_LANGUAGES.len()];
        self.language = if next == "all" {
            None
        } else {
            Some(next.to_string())
        };
    }

    pub fn cycle_sort(&mut self) {
        let all = SortKey::all();
        let idx = all.iter().position(|k| *k == self.sort).unwrap_or(0);
        self.sort = all[(idx + 1) % all.len()];
    }

    /// The feed query for these filters; blank text yields a blank query
    pub fn feed_query(&self) -> FeedQuery {
        let query = if self.is_blank() {
            String::new()
        } else {
            self.build_query()
        };
        FeedQuery::new(query, self.sort, self.order)
    }

    pub fn toggle_order(&mut self) {
        self.order = match self.order {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_plain() {
        let filters = SearchFilters {
            query: "  tui  ".to_string(),
            ..Default::default()
        };
        assert_eq!(filters.build_query(), "tui");
    }

    #[test]
    fn test_build_query_with_qualifiers() {
        let filters = SearchFilters {
            query: "http client".to_string(),
            language: Some("Rust".to_string()),
            min_stars: 500,
            ..Default::default()
        };
        assert_eq!(filters.build_query(), "http client language:Rust stars:>=500");
    }

    #[test]
    fn test_all_language_is_ignored() {
        let filters = SearchFilters {
            query: "x".to_string(),
            language: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.build_query(), "x");
    }

    #[test]
    fn test_blank_query() {
        let filters = SearchFilters {
            query: "   ".to_string(),
            language: Some("Go".to_string()),
            ..Default::default()
        };
        assert!(filters.is_blank());
    }

    #[test]
    fn test_cycle_language_wraps() {
        let mut filters = SearchFilters::default();
        filters.cycle_language();
        assert_eq!(filters.language.as_deref(), Some("JavaScript"));

        filters.language = Some("React".to_string());
        filters.cycle_language();
        assert_eq!(filters.language, None);
    }

    #[test]
    fn test_cycle_sort_and_order() {
        let mut filters = SearchFilters::default();
        filters.cycle_sort();
        assert_eq!(filters.sort, SortKey::Forks);
        filters.sort = SortKey::Created;
        filters.cycle_sort();
        assert_eq!(filters.sort, SortKey::Stars);

        filters.toggle_order();
        assert_eq!(filters.order, SortOrder::Asc);
    }

    #[test]
    fn test_feed_query_carries_sort() {
        let mut filters = SearchFilters {
            query: "cli".to_string(),
            min_stars: 10,
            ..Default::default()
        };
        filters.toggle_order();

        let query = filters.feed_query();
        assert_eq!(query.query, "cli stars:>=10");
        assert_eq!(query.order, SortOrder::Asc);

        filters.query.clear();
        assert!(filters.feed_query().is_blank());
    }
}
