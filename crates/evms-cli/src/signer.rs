//! # Key-tool signer
//!
//! Signs transactions with an external Sui key tool so that no key material
//! passes through this process. The node serializes the call into
//! transaction bytes (`unsafe_moveCall`), then
//! `sui keytool sign --address <sender> --data <bytes> --json` signs them
//! with the sender's key from the local keystore.

use async_trait::async_trait;
use serde_json::Value;

use evms_client::{MoveCall, SignedTransaction, SignerError, SuiRpcStore, TransactionSigner};
use evms_core::SuiAddress;

/// Default key tool executable.
pub const DEFAULT_KEYTOOL: &str = "sui";

/// Signs through `<program> keytool sign`.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    store: SuiRpcStore,
    sender: SuiAddress,
    program: String,
}

impl CommandSigner {
    pub fn new(store: SuiRpcStore, sender: SuiAddress, program: impl Into<String>) -> Self {
        Self {
            store,
            sender,
            program: program.into(),
        }
    }

    pub fn sender(&self) -> &SuiAddress {
        &self.sender
    }

    async fn sign_bytes(&self, tx_bytes: &str) -> Result<String, SignerError> {
        let output = tokio::process::Command::new(&self.program)
            .args(["keytool", "sign", "--address", self.sender.as_str()])
            .args(["--data", tx_bytes, "--json"])
            .output()
            .await
            .map_err(|e| SignerError::Unavailable(format!("cannot run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SignerError::Rejected(format!(
                "{} keytool exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        parse_keytool_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl TransactionSigner for CommandSigner {
    async fn sign_transaction(&self, call: &MoveCall) -> Result<SignedTransaction, SignerError> {
        let tx_bytes = self.store.build_move_call(&self.sender, call).await?;
        tracing::debug!(sender = %self.sender, target_fn = %call.target(), "signing transaction");
        let signature = self.sign_bytes(&tx_bytes).await?;
        Ok(SignedTransaction {
            tx_bytes,
            signature,
        })
    }
}

/// Extract `suiSignature` from `keytool sign --json` output.
pub fn parse_keytool_output(stdout: &str) -> Result<String, SignerError> {
    let json: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| SignerError::Rejected(format!("keytool output is not JSON: {e}")))?;
    json.get("suiSignature")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SignerError::Rejected("keytool output has no suiSignature".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_read_from_keytool_json() {
        let out = r#"{
            "suiAddress": "0xabc",
            "rawTxData": "AAEC",
            "intent": {"scope": 0, "version": 0, "app_id": 0},
            "rawIntentMsg": "AAAAAAEC",
            "digest": "x",
            "suiSignature": "AFsig=="
        }"#;
        assert_eq!(parse_keytool_output(out).unwrap(), "AFsig==");
    }

    #[test]
    fn output_without_signature_is_rejected() {
        let err = parse_keytool_output(r#"{"suiAddress": "0xabc"}"#).unwrap_err();
        assert!(matches!(err, SignerError::Rejected(_)));
        assert!(parse_keytool_output("Error: key not found").is_err());
    }
}
