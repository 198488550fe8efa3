use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug, time::Duration};
use tracing::{debug, info, warn};

pub mod nominatim;
pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    #[serde(rename = "openweather")]
    OpenWeather,
    OpenMeteo,
    Nominatim,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Nominatim => "nominatim",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo, ProviderId::Nominatim]
    }

    /// Only OpenWeather needs a credential; the others are open APIs.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "nominatim" => Ok(ProviderId::Nominatim),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, open-meteo, nominatim."
            )),
        }
    }
}

/// Bounded-timeout JSON GET against a remote endpoint. Knows nothing about
/// any particular provider.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, timeout })
    }

    /// Same connection pool, different deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self { http: self.http.clone(), timeout }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: ProviderId,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let res = self
            .http
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {provider} ({url})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read {provider} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "{provider} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse {provider} JSON"))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// One fallback tier of an operation.
///
/// `Ok(Some(_))` ends the chain, `Ok(None)` means the provider answered but
/// had nothing, `Err(_)` means the tier failed (timeout, status, payload).
#[async_trait]
pub trait Strategy<I, O>: Send + Sync + Debug
where
    I: Sync,
    O: Send,
{
    fn provider(&self) -> ProviderId;

    fn name(&self) -> String {
        self.provider().to_string()
    }

    /// Tiers that do not apply to an input are skipped without a remote call.
    fn applies(&self, _input: &I) -> bool {
        true
    }

    async fn attempt(&self, input: &I) -> Result<Option<O>>;
}

#[derive(Debug)]
pub enum Outcome<O> {
    Found(O),
    /// At least one tier answered, none had data.
    Empty,
    /// Every tier that ran failed, or none ran.
    Failed,
}

impl<O> Outcome<O> {
    pub fn found(self) -> Option<O> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::Empty | Outcome::Failed => None,
        }
    }
}

/// Ordered fallback tiers, tried until one yields a value.
#[derive(Debug)]
pub struct Chain<I, O> {
    operation: &'static str,
    tiers: Vec<Box<dyn Strategy<I, O>>>,
}

impl<I, O> Chain<I, O>
where
    I: Sync,
    O: Send,
{
    pub fn new(operation: &'static str) -> Self {
        Self { operation, tiers: Vec::new() }
    }

    pub fn then<S>(mut self, tier: S) -> Self
    where
        S: Strategy<I, O> + 'static,
    {
        self.tiers.push(Box::new(tier));
        self
    }

    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub async fn run(&self, input: &I) -> Outcome<O> {
        let mut answered = false;

        for tier in &self.tiers {
            if !tier.applies(input) {
                debug!(operation = self.operation, tier = %tier.name(), "tier skipped");
                continue;
            }

            match tier.attempt(input).await {
                Ok(Some(value)) => {
                    info!(operation = self.operation, tier = %tier.name(), "tier succeeded");
                    return Outcome::Found(value);
                }
                Ok(None) => {
                    debug!(operation = self.operation, tier = %tier.name(), "tier returned nothing");
                    answered = true;
                }
                Err(e) => {
                    warn!(operation = self.operation, tier = %tier.name(), error = %format!("{e:#}"), "tier failed");
                }
            }
        }

        if answered { Outcome::Empty } else { Outcome::Failed }
    }
}

/// Treat blank provider strings the same as missing ones.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Scripted tier for chain tests.
    #[derive(Debug, Clone)]
    pub struct Scripted {
        pub provider: ProviderId,
        pub reply: Reply,
        pub calls: Arc<AtomicUsize>,
    }

    #[derive(Debug, Clone)]
    pub enum Reply {
        Value(&'static str),
        Empty,
        Fail,
    }

    impl Scripted {
        pub fn new(provider: ProviderId, reply: Reply) -> Self {
            Self { provider, reply, calls: Arc::new(AtomicUsize::new(0)) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Strategy<String, String> for Scripted {
        fn provider(&self) -> ProviderId {
            self.provider
        }

        fn applies(&self, input: &String) -> bool {
            input != "skip"
        }

        async fn attempt(&self, _input: &String) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Value(v) => Ok(Some(v.to_string())),
                Reply::Empty => Ok(None),
                Reply::Fail => Err(anyhow!("boom")),
            }
        }
    }
}
