//! Upstream wire types.
//!
//! Every field is a `String` carried verbatim from the upstream payload.
//! Nothing is reparsed as a number, so the exact upstream formatting
//! survives through the wire response, the database row, and the client's
//! output file.

use serde::{Deserialize, Serialize};

/// The envelope the upstream source wraps its quote in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdBrlEnvelope {
    #[serde(rename = "USDBRL")]
    pub usdbrl: Quote,
}

/// One successfully fetched USD-BRL quote.
///
/// Only a fully decoded upstream payload produces a `Quote`; a partially
/// decodable body fails the envelope deserialization as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}
