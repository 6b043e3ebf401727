//! GitHub API client using octocrab

use octocrab::Octocrab;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::info;

use magpie_core::Secrets;

use crate::{Error, Result};

const API_ROOT: &str = "https://api.github.com";
const AGENT: &str = "magpie-review";

/// GitHub API client for review operations
///
/// One client serves every repository the service is installed on; the
/// owner and repository are passed per call. Typed endpoints go through
/// octocrab, endpoints octocrab does not cover (diff media type, compare,
/// review submission, GraphQL) use the raw REST helpers below.
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Create a client from an access token
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();

        let client = Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(AGENT)
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            http,
            token,
        })
    }

    /// Create a client from the secrets file / environment
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/magpie/secrets.toml
    pub fn from_secrets() -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;
        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable \
                 or add token to ~/.config/magpie/secrets.toml"
                    .to_string(),
            )
        })?;

        let client = Self::new(token)?;
        info!("Created GitHub client");
        Ok(client)
    }

    /// Get the underlying octocrab client
    pub fn octocrab(&self) -> &Octocrab {
        &self.client
    }

    /// Raw GET against the REST API with an explicit media type
    pub(crate) async fn rest_get(&self, path: &str, accept: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(format!("{}{}", API_ROOT, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, accept)
            .send()
            .await?;
        Self::checked(response).await
    }

    /// Raw POST against the REST API with a JSON body
    pub(crate) async fn rest_post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}{}", API_ROOT, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .json(body)
            .send()
            .await?;
        Self::checked(response).await
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(Error::Status { status, message })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").finish_non_exhaustive()
    }
}
