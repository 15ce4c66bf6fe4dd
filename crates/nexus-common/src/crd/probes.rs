//! Probe tuning

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Liveness/readiness probe tuning. Missing fields read as zero and are
/// clamped during defaulting.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    /// Seconds after container start before probes begin
    #[serde(default)]
    pub initial_delay_seconds: i32,
    /// Seconds before the probe times out
    #[serde(default)]
    pub timeout_seconds: i32,
    /// Seconds between probe attempts
    #[serde(default)]
    pub period_seconds: i32,
    /// Consecutive successes before marking healthy
    #[serde(default)]
    pub success_threshold: i32,
    /// Consecutive failures before marking unhealthy
    #[serde(default)]
    pub failure_threshold: i32,
}
