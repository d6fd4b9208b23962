//! Response Assembly
//!
//! Every stats endpoint answers with the same envelope: a fixed attribution
//! block, execution metadata, the echoed request parameters, and the result.

use serde::Serialize;
use std::time::Instant;

use crate::config::ApiConfig;

/// Attribution block included in every response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub url: String,
    pub text: String,
}

/// Execution metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Milliseconds spent handling the request
    pub execution_time: u64,
    pub request_url: String,
    pub api_version: String,
}

/// Response envelope
#[derive(Debug, Serialize)]
pub struct StatsResponse<Q, R> {
    pub attribution: Attribution,
    pub metadata: ResponseMetadata,
    pub query: Q,
    pub result: R,
}

/// Builds response envelopes
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    attribution: Attribution,
    api_version: String,
}

impl ResponseAssembler {
    pub fn new(attribution: Attribution, api_version: impl Into<String>) -> Self {
        Self {
            attribution,
            api_version: api_version.into(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            Attribution {
                url: config.attribution_url.clone(),
                text: config.attribution_text.clone(),
            },
            config.api_version.clone(),
        )
    }

    /// Wrap a result, timing from `started`
    pub fn assemble<Q, R>(
        &self,
        started: Instant,
        request_url: impl Into<String>,
        query: Q,
        result: R,
    ) -> StatsResponse<Q, R> {
        StatsResponse {
            attribution: self.attribution.clone(),
            metadata: ResponseMetadata {
                execution_time: started.elapsed().as_millis() as u64,
                request_url: request_url.into(),
                api_version: self.api_version.clone(),
            },
            query,
            result,
        }
    }
}
