//! HTTP client for the media server and the account service.

use anyhow::Context;
use mediactl_proto::cache::{Cache, CacheError};
use mediactl_proto::config::Config;
use mediactl_proto::protocol::{
    ButlerEnvelope, ButlerTask, Envelope, HomeUser, HomeUsersResponse, Library, Metadata,
    Resource, SwitchedUser, TimelineReport,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::command::Precondition;

pub const CLIENT_IDENTIFIER: &str = "mediactl";
pub const PRODUCT: &str = "mediactl";
const ACCOUNT_URL: &str = "https://plex.tv";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const LIBRARY_TTL: Duration = Duration::from_secs(60 * 60);
pub const PAGE_TTL: Duration = Duration::from_secs(10 * 60);
pub const PAGE_SIZE: usize = 100;

/// One page of a library listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Metadata>,
    pub total: usize,
}

struct Tokens {
    server: String,
    account: String,
}

#[derive(Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    server_id: Arc<str>,
    tokens: Arc<RwLock<Tokens>>,
    cache: Arc<Cache>,
}

impl ServerClient {
    pub fn new(
        base_url: &str,
        server_id: &str,
        server_token: &str,
        account_token: &str,
        cache: Arc<Cache>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building http client")?;
        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            server_id: Arc::from(server_id),
            tokens: Arc::new(RwLock::new(Tokens {
                server: server_token.to_string(),
                account: account_token.to_string(),
            })),
            cache,
        })
    }

    pub fn from_config(config: &Config, cache: Arc<Cache>) -> anyhow::Result<Self> {
        let (id, server) = config.active_server().ok_or_else(|| {
            Precondition::NoActiveServer(Config::config_path().display().to_string())
        })?;
        let account = if config.home_user.auth_token.is_empty() {
            &config.token
        } else {
            &config.home_user.auth_token
        };
        Self::new(&server.url, id, config.effective_token(), account, cache)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn token(&self) -> String {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .server
            .clone()
    }

    fn account_token(&self) -> String {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .account
            .clone()
    }

    /// Switch every subsequent request to another user's credentials.
    pub fn set_tokens(&self, server: &str, account: &str) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.server = server.to_string();
        tokens.account = account.to_string();
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Accept", "application/json")
            .header("X-Plex-Token", token)
            .header("X-Plex-Client-Identifier", CLIENT_IDENTIFIER)
            .header("X-Plex-Product", PRODUCT)
            .header("X-Plex-Device-Name", PRODUCT)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = self.url(path);
        debug!("client: GET {}", path);
        let resp = self
            .request(reqwest::Method::GET, &url, &self.token())
            .query(query)
            .send()
            .await
            .with_context(|| format!("requesting {path}"))?
            .error_for_status()
            .with_context(|| format!("server rejected {path}"))?;
        resp.json::<T>()
            .await
            .with_context(|| format!("decoding {path}"))
    }

    async fn container(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Envelope> {
        self.get_json::<Envelope>(path, query).await
    }

    /// Serve from the cache unless `fresh`, in which case fetch and overwrite.
    async fn cached<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fresh: bool,
        fetch: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        if !fresh {
            return self.cache.get_or_fetch(key, ttl, fetch).await;
        }
        let value = fetch().await?;
        match self.cache.set(key, &value, ttl).await {
            Ok(()) | Err(CacheError::Disabled) => {}
            Err(e) => warn!("client: cache write {} failed: {}", key, e),
        }
        Ok(value)
    }

    // ── library ──────────────────────────────────────────────────────────────

    pub async fn libraries(&self, fresh: bool) -> anyhow::Result<Vec<Library>> {
        let key = Cache::key(&self.server_id, "libraries", &());
        self.cached(&key, LIBRARY_TTL, fresh, || async {
            Ok(self
                .container("/library/sections", &[])
                .await?
                .media_container
                .directory)
        })
        .await
    }

    pub async fn section_page(
        &self,
        section_id: &str,
        start: usize,
        size: usize,
        fresh: bool,
    ) -> anyhow::Result<Page> {
        let key = Cache::key(&self.server_id, "section_page", &(section_id, start, size));
        self.cached(&key, PAGE_TTL, fresh, || async {
            let env = self
                .container(
                    &format!("/library/sections/{section_id}/all"),
                    &[
                        ("X-Plex-Container-Start", start.to_string()),
                        ("X-Plex-Container-Size", size.to_string()),
                    ],
                )
                .await?;
            let total = env.media_container.total();
            Ok(Page {
                items: env.media_container.metadata,
                total,
            })
        })
        .await
    }

    /// Every item of a section, fetched page by page.
    pub async fn section_all(&self, section_id: &str) -> anyhow::Result<Vec<Metadata>> {
        const BATCH: usize = 500;
        let mut items = Vec::new();
        loop {
            let page = self.section_page(section_id, items.len(), BATCH, false).await?;
            let got = page.items.len();
            items.extend(page.items);
            if got == 0 || items.len() >= page.total {
                break;
            }
        }
        Ok(items)
    }

    pub async fn metadata(&self, rating_key: &str) -> anyhow::Result<Metadata> {
        self.container(&format!("/library/metadata/{rating_key}"), &[])
            .await?
            .media_container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("item {rating_key} not found"))
    }

    pub async fn children(&self, rating_key: &str) -> anyhow::Result<Vec<Metadata>> {
        Ok(self
            .container(&format!("/library/metadata/{rating_key}/children"), &[])
            .await?
            .media_container
            .metadata)
    }

    pub async fn on_deck(&self) -> anyhow::Result<Vec<Metadata>> {
        Ok(self.container("/library/onDeck", &[]).await?.media_container.metadata)
    }

    pub async fn recently_added(&self) -> anyhow::Result<Vec<Metadata>> {
        Ok(self
            .container(
                "/library/recentlyAdded",
                &[("X-Plex-Container-Size", "50".to_string())],
            )
            .await?
            .media_container
            .metadata)
    }

    // ── status ───────────────────────────────────────────────────────────────

    pub async fn sessions(&self) -> anyhow::Result<Vec<Metadata>> {
        Ok(self.container("/status/sessions", &[]).await?.media_container.metadata)
    }

    pub async fn history(&self, limit: usize) -> anyhow::Result<Vec<Metadata>> {
        Ok(self
            .container(
                "/status/sessions/history/all",
                &[
                    ("sort", "viewedAt:desc".to_string()),
                    ("X-Plex-Container-Size", limit.to_string()),
                ],
            )
            .await?
            .media_container
            .metadata)
    }

    pub async fn butler_tasks(&self) -> anyhow::Result<Vec<ButlerTask>> {
        Ok(self
            .get_json::<ButlerEnvelope>("/butler", &[])
            .await?
            .tasks
            .task)
    }

    pub async fn run_task(&self, name: &str) -> anyhow::Result<()> {
        let path = format!("/butler/{name}");
        self.request(reqwest::Method::POST, &self.url(&path), &self.token())
            .send()
            .await
            .with_context(|| format!("requesting {path}"))?
            .error_for_status()
            .with_context(|| format!("server rejected {path}"))?;
        Ok(())
    }

    pub async fn report_timeline(&self, report: &TimelineReport) -> anyhow::Result<()> {
        self.request(reqwest::Method::GET, &self.url("/:/timeline"), &self.token())
            .query(&report.query())
            .send()
            .await
            .context("sending timeline")?
            .error_for_status()
            .context("timeline rejected")?;
        Ok(())
    }

    // ── account ──────────────────────────────────────────────────────────────

    pub async fn home_users(&self) -> anyhow::Result<Vec<HomeUser>> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("{ACCOUNT_URL}/api/v2/home/users"),
                &self.account_token(),
            )
            .send()
            .await
            .context("requesting home users")?
            .error_for_status()
            .context("home users rejected")?;
        Ok(resp
            .json::<HomeUsersResponse>()
            .await
            .context("decoding home users")?
            .into_users())
    }

    /// Switch to a home user. `Ok(None)` means the PIN was wrong.
    pub async fn switch_user(
        &self,
        user: &HomeUser,
        pin: Option<&str>,
    ) -> anyhow::Result<Option<(String, String)>> {
        let mut req = self.request(
            reqwest::Method::POST,
            &format!("{ACCOUNT_URL}/api/v2/home/users/{}/switch", user.uuid),
            &self.account_token(),
        );
        if let Some(pin) = pin {
            req = req.query(&[("pin", pin)]);
        }
        let resp = req.send().await.context("switching user")?;
        if resp.status() == reqwest::StatusCode::FORBIDDEN
            || resp.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            return Ok(None);
        }
        let switched: SwitchedUser = resp
            .error_for_status()
            .context("user switch rejected")?
            .json()
            .await
            .context("decoding user switch")?;

        let resources: Vec<Resource> = self
            .request(
                reqwest::Method::GET,
                &format!("{ACCOUNT_URL}/api/v2/resources"),
                &switched.auth_token,
            )
            .query(&[("includeHttps", "1")])
            .send()
            .await
            .context("requesting resources")?
            .error_for_status()
            .context("resources rejected")?
            .json()
            .await
            .context("decoding resources")?;
        let access = resources
            .into_iter()
            .find(|r| r.client_identifier == *self.server_id)
            .and_then(|r| r.access_token)
            .unwrap_or_else(|| switched.auth_token.clone());
        Ok(Some((switched.auth_token, access)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediactl_proto::config::ServerConfig;

    fn cache() -> Arc<Cache> {
        Arc::new(Cache::new("/nonexistent", false))
    }

    #[test]
    fn missing_server_is_a_precondition() {
        let err = ServerClient::from_config(&Config::default(), cache())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<Precondition>(),
            Some(Precondition::NoActiveServer(_))
        ));
    }

    #[test]
    fn urls_and_tokens() {
        let mut config = Config::default();
        config.token = "acct".into();
        config.servers.insert(
            "srv1".into(),
            ServerConfig {
                url: "http://srv:32400/".into(),
                ..Default::default()
            },
        );
        let client = ServerClient::from_config(&config, cache()).unwrap();
        assert_eq!(client.url("/library/sections"), "http://srv:32400/library/sections");
        assert_eq!(client.server_id(), "srv1");
        assert_eq!(client.token(), "acct");

        let shared = client.clone();
        client.set_tokens("kid", "kid-acct");
        assert_eq!(shared.token(), "kid");
    }
}
