//! Chain-of-custody ledger blocks, rendered read-only.
//!
//! The payload of each block is opaque: it is pretty-printed for display and
//! never interpreted. Hash linkage is the backend's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::PLACEHOLDER;

/// Body of the ledger listing endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LedgerChain {
    #[serde(default)]
    pub chain: Vec<LedgerBlock>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LedgerBlock {
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(
        default,
        rename = "prev_hash",
        alias = "previous_hash",
        alias = "prevhash"
    )]
    pub previous_hash: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Display-ready block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerCard {
    pub index: String,
    pub timestamp: String,
    pub hash: String,
    pub previous_hash: String,
    pub data: String,
}

impl LedgerBlock {
    pub fn render(&self) -> LedgerCard {
        let text = |value: &Option<String>| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        let payload = self
            .data
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let data = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

        LedgerCard {
            index: self
                .index
                .map(|index| index.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            timestamp: text(&self.timestamp),
            hash: text(&self.hash),
            previous_hash: text(&self.previous_hash),
            data,
        }
    }
}

/// Render every block in chain order.
pub fn render_chain(blocks: &[LedgerBlock]) -> Vec<LedgerCard> {
    blocks.iter().map(LedgerBlock::render).collect()
}
