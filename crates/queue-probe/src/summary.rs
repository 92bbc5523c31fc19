//! Invocation result returned to the trigger

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ProbeResult;
use crate::queue::QueueReading;

pub const SUCCESS_MESSAGE: &str = "Metrics updated";

/// Readings reported back to the caller.
///
/// Serializes as `{"message": ..., "<key>QueueLength": n, ...}` with the
/// queues in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub message: String,
    pub readings: Vec<QueueReading>,
}

impl ProbeSummary {
    pub fn success(readings: Vec<QueueReading>) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            readings,
        }
    }

    /// Length reported for `key`, if that queue was read
    pub fn length_of(&self, key: &str) -> Option<u64> {
        self.readings
            .iter()
            .find(|reading| reading.key == key)
            .map(|reading| reading.length)
    }

    fn field_name(key: &str) -> String {
        format!("{key}QueueLength")
    }
}

impl Serialize for ProbeSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len() + 1))?;
        map.serialize_entry("message", &self.message)?;
        for reading in &self.readings {
            map.serialize_entry(&Self::field_name(&reading.key), &reading.length)?;
        }
        map.end()
    }
}

/// HTTP-style status plus a JSON body, the shape schedulers such as Lambda
/// expect from a handler
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub body: String,
    #[serde(skip)]
    pub summary: ProbeSummary,
}

impl InvocationResult {
    pub fn ok(summary: ProbeSummary) -> ProbeResult<Self> {
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(&summary)?,
            summary,
        })
    }
}
