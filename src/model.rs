//! Read-only view of collected access points and their sightings.

use serde::{Deserialize, Serialize};

/// One observed wireless access point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub bssid: String,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub capabilities: String,
    pub channel: i32,
    #[serde(default)]
    pub observations: Vec<ObservationRecord>,
}

/// One timestamped sighting of a [`NetworkRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Epoch milliseconds.
    pub timestamp_millis: i64,
    /// dBm
    pub signal_level: i32,
    pub latitude: f64,
    pub longitude: f64,
}

impl NetworkRecord {
    pub fn new(bssid: &str, ssid: &str, capabilities: &str, channel: i32) -> Self {
        Self {
            bssid: bssid.to_string(),
            ssid: ssid.to_string(),
            capabilities: capabilities.to_string(),
            channel,
            observations: Vec::new(),
        }
    }

    /// Append a sighting, keeping insertion order.
    pub fn observe(mut self, observation: ObservationRecord) -> Self {
        self.observations.push(observation);
        self
    }

    /// SSID with commas replaced so the CSV column count stays stable.
    pub fn sanitized_ssid(&self) -> String {
        self.ssid.replace(',', "_")
    }
}
