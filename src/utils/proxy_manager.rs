use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One outbound proxy. `url` carries the scheme (`http://` or `socks5://`).
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyEndpoint {
    /// Accepts either a full proxy URL or the colon-separated forms
    /// `ip:port` and `ip:port:user:pass`.
    pub fn parse_line(line: &str) -> Option<Self> {
        if line.contains("://") {
            return Some(Self {
                url: line.to_string(),
                username: None,
                password: None,
            });
        }

        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 2 {
            return None;
        }

        let url = format!("http://{}:{}", parts[0], parts[1]);
        let (username, password) = if parts.len() >= 4 {
            (Some(parts[2].to_string()), Some(parts[3].to_string()))
        } else {
            (None, None)
        };

        Some(Self {
            url,
            username,
            password,
        })
    }

    pub fn build_proxy(&self) -> Result<reqwest::Proxy> {
        let mut proxy = reqwest::Proxy::all(&self.url)?;
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        Ok(proxy)
    }
}

pub struct ProxyManager;

impl ProxyManager {
    /// Loads proxies from a text file, one per line. A missing file means
    /// running without proxies, not an error.
    pub fn load_proxies(path: &str) -> Result<Vec<ProxyEndpoint>> {
        let file = Path::new(path);
        if !file.exists() {
            warn!("{} not found. Running without proxies.", path);
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(file).with_context(|| format!("failed to read {}", path))?;
        let mut proxies = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ProxyEndpoint::parse_line(line) {
                Some(proxy) => proxies.push(proxy),
                None => warn!("Skipping invalid proxy line: {}", line),
            }
        }

        info!("Loaded {} proxies from {}", proxies.len(), path);
        Ok(proxies)
    }

    /// Probes each proxy with a proxied GET and keeps only the ones that
    /// answer in time. Dead proxies are dropped without failing the run.
    pub async fn filter_live(
        proxies: Vec<ProxyEndpoint>,
        probe_url: &str,
        timeout: Duration,
    ) -> Vec<ProxyEndpoint> {
        let mut set = JoinSet::new();
        for proxy in proxies {
            let probe_url = probe_url.to_string();
            set.spawn(async move {
                match Self::probe(&proxy, &probe_url, timeout).await {
                    Ok(()) => Some(proxy),
                    Err(e) => {
                        debug!("Proxy {} failed liveness probe: {}", proxy.url, e);
                        None
                    }
                }
            });
        }

        let mut live = Vec::new();
        while let Some(res) = set.join_next().await {
            if let Ok(Some(proxy)) = res {
                live.push(proxy);
            }
        }

        info!("{} proxies passed the liveness probe", live.len());
        live
    }

    async fn probe(proxy: &ProxyEndpoint, probe_url: &str, timeout: Duration) -> Result<()> {
        let client = Client::builder()
            .proxy(proxy.build_proxy()?)
            .timeout(timeout)
            .build()?;
        client.get(probe_url).send().await?.error_for_status()?;
        Ok(())
    }
}
