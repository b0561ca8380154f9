//! Remote-platform extractor
//!
//! The legacy no-code platform exposes records over a bearer-authenticated
//! HTTP API, returning a JSON envelope with a `results` array. Its schema
//! is not known in advance, so the extractor probes a small fixed set of
//! candidate type names per entity and takes the first that returns at
//! least one record. A single page is accepted as all records; that was
//! the behavior of the original integration.

use crate::error::{MigrationError, Result};
use crate::models::{EntityStep, SourceOrigin, SourceRecord};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "nmdp-lm/0.1 (legacy migration)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Candidate legacy type names per entity, probed in order
fn candidate_type_names(step: EntityStep) -> &'static [&'static str] {
    match step {
        EntityStep::Accounts => &["users", "patients", "clients"],
        EntityStep::Referrals => &["referrals", "recommendations_of_friends"],
        EntityStep::Notes => &["notes", "patient_notes"],
        EntityStep::Messages => &["messages", "chat_messages"],
        EntityStep::ShopLinks => &["shop_links", "shopping_links", "links"],
        EntityStep::Recommendations => &["recommendations", "diet_recommendations"],
        EntityStep::Results => &["results", "test_results", "lab_results"],
        EntityStep::Interviews => &["interviews", "questionnaires", "surveys"],
    }
}

/// JSON envelope returned by the remote platform
#[derive(Debug, Deserialize)]
struct Envelope {
    results: Vec<serde_json::Value>,
}

/// Bearer-authenticated extractor for the legacy remote platform
pub struct RemoteApiExtractor {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RemoteApiExtractor {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MigrationError::Source(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Extract all records for one entity.
    ///
    /// Probes the candidate type names in order; the first non-empty
    /// response wins. Network faults and non-2xx responses read as "no
    /// records from this source" and never fail the run.
    pub async fn extract(&self, step: EntityStep) -> Vec<SourceRecord> {
        for type_name in candidate_type_names(step) {
            match self.fetch_type(type_name).await {
                Ok(records) if !records.is_empty() => {
                    debug!(
                        entity = step.source_name(),
                        type_name,
                        count = records.len(),
                        "Remote type matched"
                    );
                    return records;
                }
                Ok(_) => {
                    debug!(entity = step.source_name(), type_name, "Remote type empty");
                }
                Err(e) => {
                    warn!(
                        entity = step.source_name(),
                        type_name,
                        error = %e,
                        "Remote probe failed, trying next candidate"
                    );
                }
            }
        }
        Vec::new()
    }

    async fn fetch_type(&self, type_name: &str) -> Result<Vec<SourceRecord>> {
        let url = format!("{}/api/v1/records/{}", self.base_url, type_name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MigrationError::Source(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrationError::Source(format!(
                "{} returned {}",
                url, status
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| MigrationError::Source(format!("{}: {}", url, e)))?;

        Ok(records_from_envelope(envelope.results))
    }
}

/// Flatten envelope entries into source records.
///
/// Non-object entries are dropped: the platform wraps every row as a JSON
/// object, anything else is noise.
fn records_from_envelope(results: Vec<serde_json::Value>) -> Vec<SourceRecord> {
    results
        .into_iter()
        .filter_map(|entry| match entry {
            serde_json::Value::Object(map) => {
                let fields = map.into_iter().collect::<Vec<_>>();
                Some(SourceRecord::from_pairs(SourceOrigin::RemoteApi, fields))
            }
            _ => None,
        })
        .filter(|record| !record.is_empty())
        .collect()
}
