use serde::{ Serialize, Deserialize };
use std::collections::BTreeMap;

use crate::config::{ CloneConfig, LoyaltyCore };

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationQuery {
    pub clone: String,
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiQuery {
    pub queries: Vec<InvocationQuery>,
    /// Fan the queries out concurrently instead of one after another.
    #[serde(default)]
    pub concurrent: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloneResponse {
    pub clone: String,
    pub role: String,
    pub response: String,
    pub model: String,
    pub temperature: f64,
}

/// Who answers a streamed invoke. Sent ahead of the first fragment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CloneStreamHeader {
    pub clone: String,
    pub role: String,
    pub model: String,
    pub temperature: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub clone: String,
    pub error: String,
    pub code: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationResult {
    Success(CloneResponse),
    Failure(ErrorRecord),
}

impl InvocationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, InvocationResult::Failure(_))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MultiResponse {
    pub results: Vec<InvocationResult>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub service: String,
    pub owner: String,
    pub available_clones: usize,
    pub clones: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    pub service: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClonesListing<'a> {
    pub clones: &'a BTreeMap<String, CloneConfig>,
    pub loyalty_core: &'a LoyaltyCore,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyOwnerParams {
    pub owner_name: String,
    pub security_key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Sovereign,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerVerification {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub access_level: AccessLevel,
}
