// GitHub provider implementation - bridges API client with SearchProvider trait
use async_trait::async_trait;
use ghexplorer_api::{GitHubClient, SearchParams};
use std::time::Duration;
use tracing::info;

use crate::{config::GitHubConfig, models::Repository, search::SearchProvider, Result};

/// Wrapper around GitHubClient that implements SearchProvider
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &GitHubConfig) -> Result<Self> {
        let client = GitHubClient::with_options(
            &config.api_url,
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl SearchProvider for GitHubProvider {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Repository>> {
        let repos = self.client.search_repositories(params).await?;
        info!(
            "Fetched {} repositories for '{}' (page {})",
            repos.len(),
            params.query,
            params.page
        );
        Ok(repos.into_iter().map(Repository::from).collect())
    }
}
