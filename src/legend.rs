//! Channel labels for segmentation maps, read from a legend table.
//!
//! A legend is a JSON array of records. Only the first record is consulted: its
//! `channel_<label>` entries map a channel index (a string of digits) to a label.
//! For example `{"channel_class": "0", "channel_instance": "1"}` labels channel 0
//! `class` and channel 1 `instance`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::classify::KeyClassifier;
use crate::container::Container;
use crate::error::{Error, Result};

#[allow(unused_imports)]
use log::{debug, warn};

pub const CHANNEL_PREFIX: &str = "channel_";

pub type ChannelLabels = BTreeMap<usize, String>;

/// Anything a legend table can be fetched from by dataset name.
pub trait LegendSource {
    /// The serialized legend stored under `key`, or `None` when there is none.
    fn legend_text(&self, key: &str) -> Result<Option<String>>;
}

impl LegendSource for Container {
    fn legend_text(&self, key: &str) -> Result<Option<String>> {
        self.read_serialized_text(key)
    }
}

/// Parses a serialized legend stored under `key` into channel labels.
pub fn parse_channel_labels(key: &str, json: &str) -> Result<ChannelLabels> {
    let records: Vec<Map<String, Value>> = serde_json::from_str(json).map_err(|source| Error::Legend {
        key: key.to_string(),
        source,
    })?;

    Ok(records.first().map(labels_from_record).unwrap_or_default())
}

fn labels_from_record(record: &Map<String, Value>) -> ChannelLabels {
    let mut labels = ChannelLabels::new();
    for (name, value) in record {
        let Some(label) = name.strip_prefix(CHANNEL_PREFIX) else {
            continue;
        };
        // Only non-negative integers written as digit strings name a channel
        let Some(digits) = value.as_str() else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        // Entries are visited in document order, so a repeated channel keeps its last label
        if let Ok(channel) = digits.parse::<usize>() {
            labels.insert(channel, label.to_string());
        }
    }
    labels
}

/// Looks up the labels of a segmentation key's channels.
///
/// The legend key is the segcolormap pattern at the index of the segmap pattern
/// that matched. A missing source, a missing or empty legend, or an unreadable
/// one all yield no labels, in which case channels are named by their index.
pub fn channel_labels_for(
    classifier: &KeyClassifier,
    segmap_key: &str,
    source: Option<&dyn LegendSource>,
) -> Result<ChannelLabels> {
    let Some(legend_key) = classifier.legend_key_for(segmap_key) else {
        return Ok(ChannelLabels::new());
    };
    let Some(source) = source else {
        return Ok(ChannelLabels::new());
    };
    let Some(json) = source.legend_text(legend_key)? else {
        debug!("Legend `{}` for `{}` is not stored in this file", legend_key, segmap_key);
        return Ok(ChannelLabels::new());
    };

    match parse_channel_labels(legend_key, &json) {
        Ok(labels) => {
            debug!("Legend `{}` labels {} channel(s) of `{}`", legend_key, labels.len(), segmap_key);
            Ok(labels)
        }
        Err(e) => {
            warn!("{}; channels of `{}` are labeled by index", e, segmap_key);
            Ok(ChannelLabels::new())
        }
    }
}

/// Label of `channel`, falling back to its index.
pub fn label_for(labels: &ChannelLabels, channel: usize) -> String {
    labels
        .get(&channel)
        .cloned()
        .unwrap_or_else(|| channel.to_string())
}

#[cfg(test)]
impl LegendSource for std::collections::HashMap<String, String> {
    fn legend_text(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).cloned())
    }
}
