//! HTTP clients for the visitor lookup collaborators.
//!
//! Two collaborators are involved: a primary geolocation endpoint that
//! returns address plus city/region/country/timezone in one call, and a
//! simpler IP-only endpoint used as a degraded fallback when the primary
//! fails. Both are treated as best-effort; the resolver turns every
//! failure into placeholder values.

use crate::core::{GeoInfo, GeoLookup, IpLookup};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the lookup collaborators.
///
/// These never escape the resolver; they exist so failures can be
/// logged with a cause before being degraded to placeholders.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lookup returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("lookup response carried no address")]
    MissingAddress,
}

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the primary geolocation endpoint (ipapi.co-shaped JSON).
pub struct IpapiLookup {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl IpapiLookup {
    /// Creates a new `IpapiLookup` against the given endpoint.
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
            timeout: LOOKUP_TIMEOUT,
        }
    }
}

#[async_trait]
impl GeoLookup for IpapiLookup {
    async fn lookup(&self) -> Result<GeoInfo, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let info: GeoInfo = response.json().await?;
        // A body without an address is no better than an error; the
        // caller falls through to the fallback lookup.
        if info.ip.as_deref().map_or(true, str::is_empty) {
            return Err(LookupError::MissingAddress);
        }

        debug!(ip = ?info.ip, "primary geolocation lookup succeeded");
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct IpOnlyResponse {
    ip: Option<String>,
}

/// Client for the fallback IP-only endpoint (ipify-shaped JSON).
pub struct IpifyLookup {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl IpifyLookup {
    /// Creates a new `IpifyLookup` against the given endpoint.
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
            timeout: LOOKUP_TIMEOUT,
        }
    }
}

#[async_trait]
impl IpLookup for IpifyLookup {
    async fn lookup_ip(&self) -> Result<String, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let body: IpOnlyResponse = response.json().await?;
        body.ip
            .filter(|ip| !ip.is_empty())
            .ok_or(LookupError::MissingAddress)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod fake {
    //! Canned lookup implementations for tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A `GeoLookup` that returns a canned outcome and counts calls.
    pub struct FakeGeoLookup {
        response: Option<GeoInfo>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeGeoLookup {
        pub fn succeeding(info: GeoInfo) -> Self {
            Self {
                response: Some(info),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing() -> Self {
            Self {
                response: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl GeoLookup for FakeGeoLookup {
        async fn lookup(&self) -> Result<GeoInfo, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().ok_or(LookupError::MissingAddress)
        }
    }

    /// An `IpLookup` that returns a canned outcome and counts calls.
    pub struct FakeIpLookup {
        response: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeIpLookup {
        pub fn succeeding(ip: &str) -> Self {
            Self {
                response: Some(ip.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing() -> Self {
            Self {
                response: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl IpLookup for FakeIpLookup {
        async fn lookup_ip(&self) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().ok_or(LookupError::MissingAddress)
        }
    }
}
