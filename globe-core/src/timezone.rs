//! Timezone and local-time inference.
//!
//! Tiers, in order: a named zone from the lookup provider; the provider's
//! raw UTC offset; a fallback offset supplied by the caller (usually the
//! weather provider's own offset field). If none applies the result is
//! all-`None`, which is not an error.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Config,
    model::{Coordinates, TimezoneInfo, TimezoneSource},
    provider::{Chain, ProviderClient, openmeteo::OpenMeteoTimezone},
};

/// What the lookup provider said about a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLookup {
    pub zone_name: Option<String>,
    pub utc_offset_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedTimezone {
    pub info: TimezoneInfo,
    pub source: Option<TimezoneSource>,
}

#[derive(Debug)]
pub struct TimezoneResolver {
    chain: Chain<Coordinates, ZoneLookup>,
}

impl TimezoneResolver {
    pub fn new(config: &Config, http: &ProviderClient) -> Self {
        let http = http.with_timeout(config.timeouts.timezone());
        let chain = Chain::new("timezone")
            .then(OpenMeteoTimezone::new(&config.endpoints.open_meteo, http));
        Self { chain }
    }

    /// Provider tiers only. `None` means the lookup failed or was empty.
    pub async fn lookup(&self, coordinates: Coordinates) -> Option<ZoneLookup> {
        self.chain.run(&coordinates).await.found()
    }

    pub async fn resolve(
        &self,
        coordinates: Coordinates,
        fallback_offset_seconds: Option<i32>,
    ) -> ResolvedTimezone {
        let lookup = self.lookup(coordinates).await;
        settle(lookup.as_ref(), fallback_offset_seconds, Utc::now())
    }
}

/// Apply the three tiers to whatever is known, at instant `now`.
pub fn settle(
    lookup: Option<&ZoneLookup>,
    fallback_offset_seconds: Option<i32>,
    now: DateTime<Utc>,
) -> ResolvedTimezone {
    if let Some(lookup) = lookup {
        if let Some(name) = &lookup.zone_name {
            match name.parse::<Tz>() {
                Ok(tz) => {
                    return ResolvedTimezone {
                        info: TimezoneInfo {
                            zone_name: Some(name.clone()),
                            utc_offset_seconds: lookup.utc_offset_seconds,
                            local_time: Some(
                                now.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false),
                            ),
                        },
                        source: Some(TimezoneSource::ZoneLookup),
                    };
                }
                Err(e) => warn!(zone = %name, error = %e, "unknown zone name from provider"),
            }
        }

        if let Some(info) = lookup.utc_offset_seconds.and_then(|s| fixed_offset_info(s, now)) {
            return ResolvedTimezone { info, source: Some(TimezoneSource::ProviderOffset) };
        }
    }

    if let Some(info) = fallback_offset_seconds.and_then(|s| fixed_offset_info(s, now)) {
        return ResolvedTimezone { info, source: Some(TimezoneSource::FallbackOffset) };
    }

    debug!("no timezone tier produced a value");
    ResolvedTimezone::default()
}

fn fixed_offset_info(seconds: i32, now: DateTime<Utc>) -> Option<TimezoneInfo> {
    let Some(offset) = FixedOffset::east_opt(seconds) else {
        warn!(seconds, "UTC offset out of range");
        return None;
    };
    Some(TimezoneInfo {
        zone_name: None,
        utc_offset_seconds: Some(seconds),
        local_time: Some(now.with_timezone(&offset).to_rfc3339_opts(SecondsFormat::Secs, false)),
    })
}
