//! Per-node parameter bag.
//!
//! Every graph node carries a [`NodeParams`]: its stable id, type tag, bypass
//! flag, and two maps of configuration values (numeric and text). Lookup is
//! defensive: a missing key, NaN, or infinity yields the caller's default, so
//! a malformed graph document can never push a non-finite value into DSP
//! state. Callers apply their own domain clamping after lookup.

#[cfg(not(feature = "std"))]
use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

/// A node's identity and configuration as compiled from the graph document.
///
/// Boolean parameters from the declarative form are normalized to numeric
/// 0/1 before they land here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeParams {
    /// Stable identifier, unique within the graph.
    pub id: String,
    /// Type tag selecting the runtime factory (also encodes structural roles).
    pub effect_type: String,
    /// When true the node's DSP is skipped but its input routing still occurs.
    pub bypassed: bool,
    numeric: BTreeMap<String, f64>,
    text: BTreeMap<String, String>,
}

impl NodeParams {
    /// Create a parameter bag for a node with the given id and type.
    pub fn new(id: &str, effect_type: &str) -> Self {
        Self {
            id: id.to_string(),
            effect_type: effect_type.to_string(),
            bypassed: false,
            numeric: BTreeMap::new(),
            text: BTreeMap::new(),
        }
    }

    /// Look up a numeric parameter.
    ///
    /// Returns `default` when the key is missing or the stored value is NaN
    /// or ±infinity.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        match self.numeric.get(key) {
            Some(v) if v.is_finite() => *v,
            _ => default,
        }
    }

    /// Look up a numeric parameter and clamp it to an inclusive range.
    ///
    /// The node parameter contracts in this workspace are all "default then
    /// clamp"; this is that pattern in one call.
    pub fn number_clamped(&self, key: &str, default: f64, min: f64, max: f64) -> f64 {
        self.number(key, default).clamp(min, max)
    }

    /// Look up a text parameter. Returns the empty string when absent.
    pub fn text(&self, key: &str) -> &str {
        self.text.get(key).map_or("", |s| s.as_str())
    }

    /// Store a numeric parameter.
    pub fn set_number(&mut self, key: &str, value: f64) {
        self.numeric.insert(key.to_string(), value);
    }

    /// Store a boolean parameter as numeric 0/1.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.numeric
            .insert(key.to_string(), if value { 1.0 } else { 0.0 });
    }

    /// Store a text parameter.
    pub fn set_text(&mut self, key: &str, value: &str) {
        self.text.insert(key.to_string(), value.to_string());
    }

    /// Iterate over the numeric parameters in key order.
    pub fn numeric_entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.numeric.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
