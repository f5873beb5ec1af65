// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Selective sync.
//!
//! A [`SyncFilter`] narrows which local records a reconciliation pass turns
//! into sync items. Records it rejects stay unuploaded and are picked up by a
//! later pass once the filter allows them. The default filter allows
//! everything.

use serde::{Deserialize, Serialize};

use crate::item::ItemType;
use crate::records::{AudioRecording, RecordingSession, SensorDataRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncFilter {
    /// Item types to sync. Empty allows every type.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_types: Vec<ItemType>,

    /// Recording sessions to sync. Empty allows every session.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub session_ids: Vec<String>,

    pub exclude_audio: bool,

    /// Sensor types whose samples are never enqueued.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_sensor_types: Vec<String>,

    /// Earliest record time to sync, epoch milliseconds, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,

    /// Latest record time to sync, epoch milliseconds, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
}

impl SyncFilter {
    /// Audio files only.
    pub fn audio_only() -> Self {
        SyncFilter {
            item_types: vec![ItemType::Audio],
            ..SyncFilter::default()
        }
    }

    /// Session metadata only.
    pub fn metadata_only() -> Self {
        SyncFilter {
            item_types: vec![ItemType::Session],
            ..SyncFilter::default()
        }
    }

    /// Everything except audio, for metered links.
    pub fn no_audio() -> Self {
        SyncFilter {
            exclude_audio: true,
            ..SyncFilter::default()
        }
    }

    /// Returns true if the filter allows every record.
    pub fn is_unrestricted(&self) -> bool {
        *self == SyncFilter::default()
    }

    pub fn allows_type(&self, item_type: ItemType) -> bool {
        if self.exclude_audio && item_type == ItemType::Audio {
            return false;
        }
        self.item_types.is_empty() || self.item_types.contains(&item_type)
    }

    fn allows_session(&self, session_id: &str) -> bool {
        self.session_ids.is_empty() || self.session_ids.iter().any(|s| s == session_id)
    }

    fn allows_time(&self, time_ms: i64) -> bool {
        self.since.map_or(true, |since| time_ms >= since)
            && self.until.map_or(true, |until| time_ms <= until)
    }

    pub fn matches_session(&self, session: &RecordingSession) -> bool {
        self.allows_type(ItemType::Session)
            && self.allows_session(&session.session_id)
            && self.allows_time(session.start_time)
    }

    pub fn matches_sample(&self, sample: &SensorDataRecord) -> bool {
        self.allows_type(ItemType::SensorData)
            && self.allows_session(&sample.session_id)
            && !self
                .exclude_sensor_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&sample.sensor_type))
            && self.allows_time(sample.timestamp)
    }

    pub fn matches_audio(&self, recording: &AudioRecording) -> bool {
        self.allows_type(ItemType::Audio)
            && self.allows_session(&recording.session_id)
            && self.allows_time(recording.timestamp)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
