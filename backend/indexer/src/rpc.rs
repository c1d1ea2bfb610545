//! Soroban RPC client — polls `getEvents` and decodes registry events.
//!
//! Events are requested with `xdrFormat: "json"`, so topics and data arrive
//! as stellar-xdr JSON in `topicJson` / `valueJson` (see [`crate::scval`]).
//!
//! ## Resilience
//!
//! * Rate limits, transport failures and soft JSON-RPC errors are retried with
//!   exponential back-off capped at [`MAX_BACKOFF_SECS`].
//! * Invalid-request / unknown-method errors abort the poll immediately.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, RegistryEvent};
use crate::scval;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// JSON-RPC codes that retrying cannot fix.
const HARD_ERROR_CODES: [i64; 2] = [-32600, -32601];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Unique per event: `<ledger/tx/op toid>-<event index>`.
    pub id: String,
    /// Topics as stellar-xdr JSON `ScVal`s.
    #[serde(default)]
    pub topic_json: Vec<Value>,
    /// Event data as a stellar-xdr JSON `ScVal`.
    #[serde(default)]
    pub value_json: Value,
    pub contract_id: Option<String>,
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_closed_at: Option<String>,
    pub in_successful_contract_call: Option<bool>,
}

/// One page of `getEvents` output.
#[derive(Debug, Default)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self, reason: &str) {
        warn!("{reason} (will retry in {}s)", self.secs);
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events emitted by `contract_id`.
///
/// A `cursor` from a previous page takes precedence over `start_ledger`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });
    let mut backoff = Backoff::new();

    loop {
        let resp = match client.post(rpc_url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                backoff.wait(&format!("RPC request failed: {e}")).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            backoff.wait("Rate-limited by RPC").await;
            continue;
        }

        let parsed: RpcResponse = resp.json().await?;
        if let Some(err) = parsed.error {
            if HARD_ERROR_CODES.contains(&err.code) {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            backoff
                .wait(&format!("RPC soft error {}: {}", err.code, err.message))
                .await;
            continue;
        }

        let result = parsed.result.ok_or(IndexerError::EmptyResult)?;
        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
        "xdrFormat": "json",
    });

    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }
    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode raw RPC events into [`RegistryEvent`]s.
///
/// Events from failed contract calls are dropped; events that do not decode
/// are logged and skipped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<RegistryEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| match decode_single(e, contract_id) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!("Skipping event: {err}");
                None
            }
        })
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Result<RegistryEvent> {
    let malformed = |reason: &str| IndexerError::Decode {
        event_id: raw.id.clone(),
        reason: reason.to_string(),
    };

    let topic = raw
        .topic_json
        .first()
        .and_then(scval::as_symbol)
        .ok_or_else(|| malformed("first topic is not a symbol"))?;
    let kind = EventKind::from_topic(topic);

    let mut event = RegistryEvent {
        event_id: raw.id.clone(),
        event_type: kind.as_str().to_string(),
        product_id: None,
        actor: None,
        target: None,
        name: None,
        status: None,
        location: None,
        role: None,
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp: raw
            .ledger_closed_at
            .as_deref()
            .and_then(parse_iso_to_unix)
            .unwrap_or(0),
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    };

    let data = &raw.value_json;
    match kind {
        EventKind::ProductAdded => {
            event.product_id = Some(product_id(raw).ok_or_else(|| malformed("no product id"))?);
            event.name = field(data, "name", scval::as_string);
            event.status = field(data, "status", scval::as_string);
            event.location = field(data, "location", scval::as_string);
            event.actor = field(data, "added_by", scval::as_address);
        }
        EventKind::ProductUpdated => {
            event.product_id = Some(product_id(raw).ok_or_else(|| malformed("no product id"))?);
            event.status = field(data, "status", scval::as_string);
            event.location = field(data, "location", scval::as_string);
        }
        EventKind::RoleAssigned => {
            event.target = raw
                .topic_json
                .get(1)
                .and_then(scval::as_address)
                .map(str::to_owned)
                .or_else(|| field(data, "target", scval::as_address));
            let role = scval::map_get(data, "role")
                .and_then(scval::as_unit_variant)
                .and_then(role_name)
                .ok_or_else(|| malformed("no recognised role"))?;
            event.role = Some(role.to_string());
            event.actor = field(data, "assigned_by", scval::as_address);
        }
        EventKind::Unknown => {}
    }

    Ok(event)
}

/// Product id from the second topic, falling back to the data payload.
fn product_id(raw: &RawEvent) -> Option<i64> {
    raw.topic_json
        .get(1)
        .and_then(scval::as_u64)
        .or_else(|| scval::map_get(&raw.value_json, "product_id").and_then(scval::as_u64))
        .and_then(|id| i64::try_from(id).ok())
}

fn field(data: &Value, key: &str, read: fn(&Value) -> Option<&str>) -> Option<String> {
    scval::map_get(data, key).and_then(read).map(str::to_owned)
}

/// Map a `Role` variant to the name the contract reports from `check_my_role`.
fn role_name(variant: &str) -> Option<&'static str> {
    match variant {
        "Manager" => Some("MANAGER"),
        "Operator" => Some("OPERATOR"),
        "Viewer" => Some("VIEWER"),
        "None" => Some("NO ROLE"),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
