use chrono::{DateTime, Utc};
use ghexplorer_api::{GitHubOwner, GitHubRepo};
use serde::{Deserialize, Serialize};

/// Repository model - the star of the show
///
/// Serialized with GitHub's own field names, so bookmarks written by this
/// crate and raw search payloads are interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(rename = "stargazers_count")]
    pub stars: u32,
    #[serde(rename = "forks_count")]
    pub forks: u32,
    #[serde(rename = "open_issues_count")]
    pub open_issues: u32,
    #[serde(rename = "watchers_count", default)]
    pub watchers: u32,
    #[serde(default)]
    pub language: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl Repository {
    /// Text the bookmark filter matches against
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.description.as_deref().unwrap_or(""),
            self.owner.login
        )
    }

    /// Page URL, rebuilt from the full name when the payload lacked one
    pub fn url(&self) -> String {
        if self.html_url.is_empty() {
            format!("https://github.com/{}", self.full_name)
        } else {
            self.html_url.clone()
        }
    }
}

impl From<GitHubRepo> for Repository {
    fn from(gh: GitHubRepo) -> Self {
        Repository {
            id: gh.id,
            name: gh.name,
            full_name: gh.full_name,
            owner: gh.owner.into(),
            description: gh.description,
            html_url: gh.html_url,
            stars: gh.stargazers_count,
            forks: gh.forks_count,
            open_issues: gh.open_issues_count,
            watchers: gh.watchers_count,
            language: gh.language,
            updated_at: gh.updated_at,
        }
    }
}

impl From<GitHubOwner> for Owner {
    fn from(owner: GitHubOwner) -> Self {
        Owner {
            login: owner.login,
            avatar_url: owner.avatar_url,
        }
    }
}

/// Test fixtures shared by the unit tests in this crate
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn repo(id: u64, name: &str) -> Repository {
        Repository {
            id,
            name: name.to_string(),
            full_name: format!("owner/{}", name),
            owner: Owner {
                login: "owner".to_string(),
                avatar_url: String::new(),
            },
            description: None,
            html_url: format!("https://github.com/owner/{}", name),
            stars: 0,
            forks: 0,
            open_issues: 0,
            watchers: 0,
            language: None,
            updated_at: Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_github_field_names() {
        let mut repo = fixtures::repo(7, "tokio");
        repo.stars = 25_000;
        let json = serde_json::to_value(&repo).unwrap();

        assert_eq!(json["stargazers_count"], 25_000);
        assert_eq!(json["forks_count"], 0);
        assert_eq!(json["owner"]["login"], "owner");
        assert!(json.get("stars").is_none());
    }

    #[test]
    fn test_reads_raw_github_payload() {
        let raw = r#"{
            "id": 1, "name": "x", "full_name": "a/x",
            "owner": {"login": "a", "avatar_url": "u"},
            "description": "d", "html_url": "https://github.com/a/x",
            "stargazers_count": 3, "forks_count": 2, "open_issues_count": 1,
            "forks": 2, "open_issues": 1,
            "language": "Go", "updated_at": "2025-03-01T10:00:00Z"
        }"#;
        let repo: Repository = serde_json::from_str(raw).unwrap();

        assert_eq!(repo.stars, 3);
        assert_eq!(repo.open_issues, 1);
        assert_eq!(repo.watchers, 0);
        assert_eq!(repo.search_text(), "x d a");
    }

    #[test]
    fn test_url_fallback() {
        let mut repo = fixtures::repo(1, "x");
        repo.html_url.clear();
        assert_eq!(repo.url(), "https://github.com/owner/x");
    }
}
