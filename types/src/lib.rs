use serde::{Deserialize, Deserializer, Serialize};

/// Inbound job payload. Only `filename` is required; any other keys are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "non_empty_string")]
    pub filename: String,
}

impl Job {
    /// Decodes a raw queue body into a job.
    ///
    /// # Errors
    /// Returns an error if the body is not a JSON object with a non-empty
    /// string `filename` key.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Outbound success payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationResponse {
    pub duration: u64,
}

impl DurationResponse {
    /// Encodes the payload as the byte string handed to the queue.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("filename must not be empty"));
    }
    Ok(s)
}
