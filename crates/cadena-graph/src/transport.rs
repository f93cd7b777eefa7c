//! JSON transport for the declarative graph form.
//!
//! The canonical document shape:
//!
//! ```json
//! { "nodes": [ { "id": "...", "type": "...", "bypassed": false,
//!               "params": { "ratio": 4.0, "mode": "softclip" } } ],
//!   "connections": [ { "from": "a", "to": "b",
//!                      "fromPortIndex": 0, "toPortIndex": 1 } ] }
//! ```
//!
//! Parameter values are recursively untyped: any JSON number lands in the
//! numeric map as f64, booleans become 0/1, strings go to the text map, and
//! every other shape (arrays, nested objects, null) is ignored. Missing
//! port indices default to 0; negative indices clamp to 0.

use cadena_core::NodeParams;
use serde::Deserialize;
use serde_json::Value;

/// Top-level graph document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDoc {
    /// Declared nodes.
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
    /// Declared connections.
    #[serde(default)]
    pub connections: Vec<ConnectionDoc>,
}

/// One node declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDoc {
    /// Stable node id.
    #[serde(default)]
    pub id: String,
    /// Effect-type tag.
    #[serde(rename = "type", default)]
    pub effect_type: String,
    /// Skip the node's DSP while keeping its routing.
    #[serde(default)]
    pub bypassed: bool,
    /// UI pinning flag; accepted, not interpreted by the engine.
    #[serde(default)]
    pub fixed: bool,
    /// Untyped parameter object.
    #[serde(default)]
    pub params: Value,
}

/// One connection declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionDoc {
    /// Source node id.
    #[serde(default)]
    pub from: String,
    /// Destination node id.
    #[serde(default)]
    pub to: String,
    /// Source output port (0 = main, 1 = band-splitter high band).
    #[serde(rename = "fromPortIndex", default)]
    pub from_port_index: i64,
    /// Destination input port (0 = main, 1 = sidechain).
    #[serde(rename = "toPortIndex", default)]
    pub to_port_index: i64,
}

impl NodeDoc {
    /// Build the node's parameter bag, coercing the untyped params object.
    pub fn to_params(&self) -> NodeParams {
        let mut params = NodeParams::new(&self.id, &self.effect_type);
        params.bypassed = self.bypassed;
        if let Value::Object(map) = &self.params {
            for (key, value) in map {
                match value {
                    Value::Number(n) => {
                        if let Some(v) = n.as_f64() {
                            params.set_number(key, v);
                        }
                    }
                    Value::Bool(b) => params.set_flag(key, *b),
                    Value::String(s) => params.set_text(key, s),
                    // Arrays, nested objects, and null carry no parameter
                    // semantics.
                    _ => {}
                }
            }
        }
        params
    }
}
