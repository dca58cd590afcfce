//! Raw telemetry sample: a keyed bag of per-car channels.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TelemetryResult;

/// Values of one channel, indexed by car slot.
///
/// Deserialization is untagged, so a JSON array of whole numbers lands in `Int`;
/// use the typed accessors on [`RawTelemetrySample`], which widen ints to floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelData {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f64>),
}

impl ChannelData {
    pub fn len(&self) -> usize {
        match self {
            ChannelData::Bool(v) => v.len(),
            ChannelData::Int(v) => v.len(),
            ChannelData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<bool>> for ChannelData {
    fn from(values: Vec<bool>) -> Self {
        ChannelData::Bool(values)
    }
}

impl From<Vec<i32>> for ChannelData {
    fn from(values: Vec<i32>) -> Self {
        ChannelData::Int(values)
    }
}

impl From<Vec<f64>> for ChannelData {
    fn from(values: Vec<f64>) -> Self {
        ChannelData::Float(values)
    }
}

/// Immutable snapshot of every channel the bridge delivered in one update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTelemetrySample {
    channels: BTreeMap<String, ChannelData>,
}

impl RawTelemetrySample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> TelemetryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_channel(mut self, name: impl Into<String>, data: impl Into<ChannelData>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<ChannelData>) {
        self.channels.insert(name.into(), data.into());
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelData> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Boolean channel. Int channels are read as `value != 0`.
    ///
    /// An empty channel reads as an empty slice whatever its variant, since
    /// JSON `[]` carries no element type.
    pub fn bools(&self, name: &str) -> Option<Cow<'_, [bool]>> {
        let data = self.channels.get(name)?;
        if data.is_empty() {
            return Some(Cow::Borrowed(&[]));
        }
        match data {
            ChannelData::Bool(v) => Some(Cow::Borrowed(v.as_slice())),
            ChannelData::Int(v) => Some(Cow::Owned(v.iter().map(|x| *x != 0).collect())),
            ChannelData::Float(_) => None,
        }
    }

    /// Integer channel. Bool channels are read as 0/1; float channels do not convert.
    pub fn ints(&self, name: &str) -> Option<Cow<'_, [i32]>> {
        let data = self.channels.get(name)?;
        if data.is_empty() {
            return Some(Cow::Borrowed(&[]));
        }
        match data {
            ChannelData::Int(v) => Some(Cow::Borrowed(v.as_slice())),
            ChannelData::Bool(v) => Some(Cow::Owned(v.iter().map(|x| i32::from(*x)).collect())),
            ChannelData::Float(_) => None,
        }
    }

    /// Float channel. Int channels are widened losslessly.
    pub fn floats(&self, name: &str) -> Option<Cow<'_, [f64]>> {
        let data = self.channels.get(name)?;
        if data.is_empty() {
            return Some(Cow::Borrowed(&[]));
        }
        match data {
            ChannelData::Float(v) => Some(Cow::Borrowed(v.as_slice())),
            ChannelData::Int(v) => Some(Cow::Owned(v.iter().map(|x| f64::from(*x)).collect())),
            ChannelData::Bool(_) => None,
        }
    }

    pub fn scalar_f64(&self, name: &str) -> Option<f64> {
        self.floats(name)?.first().copied()
    }

    pub fn scalar_i32(&self, name: &str) -> Option<i32> {
        self.ints(name)?.first().copied()
    }

    /// Overlay the channels of `partial` onto this sample. Channels the partial
    /// does not carry keep their last-known values.
    pub fn merge_from(&mut self, partial: &RawTelemetrySample) {
        for (name, data) in &partial.channels {
            self.channels.insert(name.clone(), data.clone());
        }
    }

    pub fn merged_with(&self, partial: &RawTelemetrySample) -> RawTelemetrySample {
        let mut merged = self.clone();
        merged.merge_from(partial);
        merged
    }
}
