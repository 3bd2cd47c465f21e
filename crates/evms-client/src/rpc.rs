//! JSON-RPC binding of the store contracts against a Sui full node.
//!
//! ## Methods Used
//!
//! | Method | Operation |
//! |--------|-----------|
//! | `sui_getObject` | Read the system-state object |
//! | `suix_getDynamicFieldObject` | Read one evidence table entry (key `{type: "u64", value: "<i>"}`) |
//! | `unsafe_moveCall` | Serialize a call description into transaction bytes |
//! | `sui_executeTransactionBlock` | Submit a signed transaction |
//!
//! ## Object Layout
//!
//! The system-state object carries `max_evidence` (highest assigned index)
//! and `evidences` (the table, whose handle is `evidences.fields.id.id`).
//! Each table entry wraps the record in `fields.value.fields`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use evms_core::{EvidenceRecord, ObjectId, RecordIndex, SuiAddress, SystemState};

use crate::error::StoreError;
use crate::store::{
    ExecutionStatus, MoveCall, RecordReader, SignedTransaction, TransactionExecutor,
    TransactionReceipt,
};

const GET_OBJECT: &str = "sui_getObject";
const GET_DYNAMIC_FIELD: &str = "suix_getDynamicFieldObject";
const MOVE_CALL: &str = "unsafe_moveCall";
const EXECUTE: &str = "sui_executeTransactionBlock";

// -- Response envelopes -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// `SuiObjectResponse`: either `data` or an `error` describing why the
/// object could not be returned.
#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(default)]
    data: Option<ObjectData>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ObjectData {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    digest: String,
    #[serde(default)]
    effects: Option<Effects>,
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Effects {
    status: EffectsStatus,
}

#[derive(Debug, Deserialize)]
struct EffectsStatus {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

// -- Client -------------------------------------------------------------------

/// JSON-RPC client for a Sui full node.
#[derive(Debug, Clone)]
pub struct SuiRpcStore {
    http: reqwest::Client,
    url: Url,
    next_id: Arc<AtomicU64>,
}

impl SuiRpcStore {
    pub(crate) fn new(http: reqwest::Client, url: Url) -> Self {
        Self {
            http,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The node endpoint this client talks to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue one JSON-RPC call and unwrap its `result`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "store RPC call");

        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                method: method.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                method: method.into(),
                status,
                body,
            });
        }

        let envelope: RpcEnvelope<T> = resp.json().await.map_err(|e| StoreError::Decode {
            method: method.into(),
            reason: e.to_string(),
        })?;

        if let Some(err) = envelope.error {
            return Err(StoreError::Rpc {
                method: method.into(),
                code: err.code,
                message: err.message,
            });
        }

        envelope.result.ok_or_else(|| StoreError::Decode {
            method: method.into(),
            reason: "response carries neither result nor error".into(),
        })
    }

    /// Serialize a call description into unsigned transaction bytes, with
    /// `sender` paying gas from any of its coins.
    pub async fn build_move_call(
        &self,
        sender: &SuiAddress,
        call: &MoveCall,
    ) -> Result<String, StoreError> {
        let params = json!([
            sender.as_str(),
            call.package.as_str(),
            call.module,
            call.function,
            [],
            call.arguments,
            null,
            call.gas_budget.to_string(),
        ]);
        let bytes: TransactionBytes = self.call(MOVE_CALL, params).await?;
        Ok(bytes.tx_bytes)
    }
}

#[async_trait]
impl RecordReader for SuiRpcStore {
    async fn get_system_state(&self, id: &ObjectId) -> Result<SystemState, StoreError> {
        let resp: ObjectResponse = self
            .call(GET_OBJECT, json!([id.as_str(), {"showContent": true}]))
            .await?;

        let not_found = |detail: String| StoreError::NotFound {
            object: format!("system state {id}"),
            detail,
        };

        if let Some(err) = resp.error {
            return Err(not_found(describe_object_error(&err)));
        }
        let content = resp
            .data
            .and_then(|d| d.content)
            .ok_or_else(|| not_found("object has no content".into()))?;

        parse_system_state(&content).map_err(not_found)
    }

    async fn get_record_at(
        &self,
        table: &ObjectId,
        index: RecordIndex,
    ) -> Result<Option<EvidenceRecord>, StoreError> {
        let params = json!([table.as_str(), {"type": "u64", "value": index.key()}]);
        let resp: ObjectResponse = match self.call(GET_DYNAMIC_FIELD, params).await {
            Ok(resp) => resp,
            Err(StoreError::Rpc { code, ref message, .. })
                if !is_reserved_code(code) && is_missing_field_message(message) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        if let Some(err) = resp.error {
            let detail = describe_object_error(&err);
            if ABSENT_OBJECT_CODES.contains(&detail.as_str()) {
                return Ok(None);
            }
            return Err(StoreError::Object {
                method: GET_DYNAMIC_FIELD.into(),
                object: format!("entry {index}"),
                detail,
            });
        }
        let Some(content) = resp.data.and_then(|d| d.content) else {
            return Ok(None);
        };

        parse_evidence_entry(&content)
            .map(Some)
            .map_err(|reason| StoreError::Decode {
                method: format!("{GET_DYNAMIC_FIELD} [{index}]"),
                reason,
            })
    }
}

#[async_trait]
impl TransactionExecutor for SuiRpcStore {
    async fn execute(&self, tx: &SignedTransaction) -> Result<TransactionReceipt, StoreError> {
        let params = json!([
            tx.tx_bytes,
            [tx.signature],
            {"showEffects": true, "showEvents": true},
            "WaitForLocalExecution",
        ]);
        let resp: ExecuteResponse = self.call(EXECUTE, params).await?;

        let effects = resp.effects.ok_or_else(|| StoreError::Decode {
            method: EXECUTE.into(),
            reason: format!("transaction {} returned no effects", resp.digest),
        })?;

        let status = if effects.status.status == "success" {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failure {
                error: effects
                    .status
                    .error
                    .unwrap_or_else(|| effects.status.status.clone()),
            }
        };

        Ok(TransactionReceipt {
            digest: resp.digest,
            status,
            event_count: resp.events.len(),
        })
    }
}

// -- Object decoding ----------------------------------------------------------

fn describe_object_error(err: &Value) -> String {
    err.get("code")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

/// Object error codes meaning the entry is simply not there.
const ABSENT_OBJECT_CODES: &[&str] = &["dynamicFieldNotFound", "notExists", "deleted"];

/// JSON-RPC 2.0 reserves -32768..=-32000 for protocol and server errors.
fn is_reserved_code(code: i64) -> bool {
    (-32768..=-32000).contains(&code)
}

fn is_missing_field_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("dynamic field")
        && (lower.contains("not found") || lower.contains("cannot find") || lower.contains("does not exist"))
}

/// Decode `max_evidence` and the table handle from one system-state content
/// payload.
fn parse_system_state(content: &Value) -> Result<SystemState, String> {
    let max = content
        .pointer("/fields/max_evidence")
        .ok_or("field max_evidence is absent")?;
    let max_index = match max {
        Value::Null => None,
        other => Some(RecordIndex(as_u64(other).ok_or_else(|| {
            format!("max_evidence {other} is not an unsigned 64-bit integer")
        })?)),
    };

    let table = content
        .pointer("/fields/evidences/fields/id/id")
        .and_then(Value::as_str)
        .ok_or("field evidences.fields.id.id is absent")?;
    let table = ObjectId::parse(table).map_err(|e| format!("table handle: {e}"))?;

    Ok(SystemState { max_index, table })
}

/// Decode the record wrapped in a dynamic-field entry.
fn parse_evidence_entry(content: &Value) -> Result<EvidenceRecord, String> {
    let fields = content
        .pointer("/fields/value/fields")
        .ok_or("entry has no fields.value.fields")?;

    let field = |name: &str| fields.get(name).ok_or(format!("field {name} is absent"));
    let text = |name: &str| field(name).and_then(|v| as_text(v).ok_or(format!("field {name} is not scalar")));
    let number = |name: &str| {
        field(name).and_then(|v| as_u64(v).ok_or(format!("field {name} is not an unsigned integer")))
    };
    let bytes = |name: &str| field(name).and_then(|v| as_bytes(v).ok_or(format!("field {name} is not a byte vector")));

    Ok(EvidenceRecord {
        evidence_id: text("evidence_id")?,
        case_number: number("case_no")?,
        fir_number: number("fir_no")?,
        content_hash: bytes("ipfs")?,
        content: bytes("content")?,
        access_enabled: field("access")?
            .as_bool()
            .ok_or("field access is not a bool")?,
        custodian: text("head")?,
        latitude: text("latitude")?,
        longitude: text("longitude")?,
        submitted_at: text("date")?,
    })
}

/// Store integers arrive as decimal strings (u64 and wider) or JSON numbers.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        Value::String(s) => Some(s.as_bytes().to_vec()),
        _ => None,
    }
}
