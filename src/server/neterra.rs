use reqwest::Url;
use tracing::{debug, warn};

use super::playlist::build_playlist;
use super::registry::ChannelRegistry;
use super::session::Session;
use super::types::{CatalogGroups, LiveCatalog, PlayLink};
use crate::error::{UpstreamError, UpstreamResult};

pub const DEFAULT_BASE_URL: &str = "http://www.neterra.tv";

const LOGIN_PATH: &str = "/user/login_page";
const LIVE_PATH: &str = "/content/live";
const GET_STREAM_PATH: &str = "/content/get_stream";

const GET_STREAM_PARAM_ISSUE: &str = "issue_id";
const GET_STREAM_PARAM_QUALITY: &str = "quality";
const GET_STREAM_PARAM_TYPE: &str = "type";
const GET_STREAM_VALUE_QUALITY: &str = "0";
const GET_STREAM_VALUE_TYPE: &str = "live";

// ── Upstream endpoints ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: String,
    pub live: String,
    pub get_stream: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            login: format!("{base}{LOGIN_PATH}"),
            live: format!("{base}{LIVE_PATH}"),
            get_stream: format!("{base}{GET_STREAM_PATH}"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// ── Shared upstream service state ──────────────────────────────────────────────

pub struct NeterraService {
    session: Session,
    endpoints: Endpoints,
    registry: ChannelRegistry,
    host: String,
    port: String,
    strict_login: bool,
}

impl NeterraService {
    pub fn new(
        session: Session,
        endpoints: Endpoints,
        registry: ChannelRegistry,
        host: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            session,
            endpoints,
            registry,
            host: host.into(),
            port: port.into(),
            strict_login: false,
        }
    }

    /// Abort upstream calls when the login did not go through, instead of
    /// trying them anyway.
    pub fn with_strict_login(mut self, strict: bool) -> Self {
        self.strict_login = strict;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn authenticate(&self) -> UpstreamResult<()> {
        match self.session.ensure_authenticated().await {
            Ok(status) if status.is_authenticated() => Ok(()),
            Ok(_) if self.strict_login => Err(UpstreamError::NotAuthenticated),
            Err(e) if self.strict_login => Err(e.into()),
            Ok(_) => {
                debug!("continuing without an authenticated session");
                Ok(())
            }
            Err(e) => {
                debug!("continuing after login failure: {e}");
                Ok(())
            }
        }
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    /// Fetch the live catalog as groups of channel variants.
    pub async fn fetch_catalog(&self) -> UpstreamResult<CatalogGroups> {
        self.authenticate().await?;

        let resp = self
            .session
            .client()
            .await
            .get(&self.endpoints.live)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status()));
        }

        let body = resp.text().await?;
        match serde_json::from_str::<LiveCatalog>(&body) {
            Ok(catalog) => Ok(catalog.into_groups()),
            Err(source) => {
                warn!("live catalog did not parse, session may not be authenticated");
                Err(UpstreamError::CatalogParse { body, source })
            }
        }
    }

    /// Full M3U playlist for the current live catalog.
    pub async fn get_playlist(&self) -> UpstreamResult<String> {
        let groups = self.fetch_catalog().await?;
        debug!("rendering playlist for {} catalog groups", groups.len());
        Ok(build_playlist(
            &groups,
            &self.registry,
            &self.host,
            &self.port,
        ))
    }

    // ── Streams ──────────────────────────────────────────────────────────────

    /// Exchange a channel id for a short-lived playback URL. Never cached.
    pub async fn resolve_stream(&self, channel_id: &str) -> UpstreamResult<String> {
        self.authenticate().await?;

        let form = [
            (GET_STREAM_PARAM_ISSUE, channel_id),
            (GET_STREAM_PARAM_QUALITY, GET_STREAM_VALUE_QUALITY),
            (GET_STREAM_PARAM_TYPE, GET_STREAM_VALUE_TYPE),
        ];

        let resp = self
            .session
            .client()
            .await
            .post(&self.endpoints.get_stream)
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status()));
        }

        let body = resp.text().await?;
        let reply: PlayLink = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::StreamResolution(format!("invalid response: {e}")))?;

        let link = reply
            .link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| UpstreamError::StreamResolution("empty play_link".to_string()))?;

        Url::parse(&link)
            .map_err(|e| UpstreamError::StreamResolution(format!("invalid play_link: {e}")))?;

        Ok(link)
    }

    pub async fn get_stream_url(&self, channel_id: &str) -> UpstreamResult<String> {
        let url = self.resolve_stream(channel_id).await?;
        debug!("resolved channel {channel_id} to {url}");
        Ok(url)
    }
}
