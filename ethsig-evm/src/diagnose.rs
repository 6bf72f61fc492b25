//! Explanations for failed personal-message signatures.
//!
//! Each [`Scenario`] rebuilds the digest the way a common signing mistake
//! would have, and the signature is validated again against that digest. The
//! first scenario that validates is reported.

use alloy_primitives::{Address, B256, Bytes, hex, keccak256};
use alloy_provider::Provider;
use ethsig::Digest;
use serde::Serialize;

use crate::error::ValidationError;
use crate::validator::{UniversalValidator, validate};

/// Rebuilds an alternate digest from the message bytes. `None` means the
/// scenario does not apply to this message.
pub type DigestTransform = fn(&[u8]) -> Option<B256>;

/// A known signing mistake.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Stable identifier.
    pub label: &'static str,
    /// Human-readable explanation shown when the scenario matches.
    pub reason: &'static str,
    /// Alternate digest.
    pub transform: DigestTransform,
}

/// A matched scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    /// Label of the matching scenario.
    pub scenario: &'static str,
    /// Explanation for the caller.
    pub reason: String,
}

/// `keccak256(message)` was signed instead of the EIP-191 digest.
pub const MISSING_PREFIX: Scenario = Scenario {
    label: "missing-prefix",
    reason: "The signature is valid for keccak256(message) without the \
             \"\\x19Ethereum Signed Message:\\n\" prefix. Sign with personal_sign \
             (EIP-191) instead of signing the raw hash.",
    transform: unprefixed_digest,
};

/// The message is hex text, but the signer signed the decoded bytes.
pub const HEX_MESSAGE_SIGNED_AS_BYTES: Scenario = Scenario {
    label: "hex-message-signed-as-bytes",
    reason: "The message is a hex string, and the signature is valid for its decoded \
             bytes rather than its text. Pass the same representation to both \
             signer and verifier.",
    transform: hex_message_as_bytes,
};

/// The message is a 32-byte hex string that was signed as a bare hash.
pub const HEX_MESSAGE_SIGNED_AS_RAW_HASH: Scenario = Scenario {
    label: "hex-message-signed-as-raw-hash",
    reason: "The message is a 32-byte hex hash, and the signature is valid for that \
             hash signed directly with no prefix.",
    transform: hex_message_as_raw_hash,
};

fn unprefixed_digest(message: &[u8]) -> Option<B256> {
    Some(keccak256(message))
}

fn decode_hex_text(message: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(message).ok()?;
    hex::decode(text.strip_prefix("0x")?).ok()
}

fn hex_message_as_bytes(message: &[u8]) -> Option<B256> {
    decode_hex_text(message)
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| Digest::personal_message(&bytes).into())
}

fn hex_message_as_raw_hash(message: &[u8]) -> Option<B256> {
    decode_hex_text(message).and_then(|bytes| B256::try_from(bytes.as_slice()).ok())
}

/// Ordered table of scenarios, tried first to last.
#[derive(Debug, Clone)]
pub struct DiagnosticEngine {
    scenarios: Vec<Scenario>,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self {
            scenarios: vec![
                MISSING_PREFIX,
                HEX_MESSAGE_SIGNED_AS_BYTES,
                HEX_MESSAGE_SIGNED_AS_RAW_HASH,
            ],
        }
    }
}

impl DiagnosticEngine {
    /// An engine with no scenarios.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    /// Appends a scenario after the existing ones.
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Scenarios in evaluation order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Finds the first scenario under which `signature` validates.
    ///
    /// A re-validation that errors is inconclusive and the next scenario is
    /// tried. Returns `None` when nothing matches.
    pub async fn explain_failure<P: Provider>(
        &self,
        provider: &P,
        validator: &UniversalValidator,
        address: Address,
        message: &[u8],
        signature: &Bytes,
    ) -> Option<Diagnosis> {
        for scenario in &self.scenarios {
            let Some(digest) = (scenario.transform)(message) else {
                continue;
            };
            match validate(provider, validator, address, digest, signature).await {
                Ok(true) => {
                    return Some(Diagnosis {
                        scenario: scenario.label,
                        reason: scenario.reason.to_owned(),
                    });
                }
                Ok(false) => {}
                Err(err) => inconclusive(scenario.label, &err),
            }
        }
        None
    }
}

#[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
fn inconclusive(label: &str, err: &ValidationError) {
    #[cfg(feature = "telemetry")]
    tracing::debug!(scenario = label, error = %err, "diagnostic scenario inconclusive");
}

#[cfg(test)]
mod tests {
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;
    use crate::testing::{MockNode, RpcReply, TEST_KEY, simulated_validator};

    fn signer() -> PrivateKeySigner {
        TEST_KEY.parse().unwrap()
    }

    fn to_bytes(signature: &alloy_primitives::Signature) -> Bytes {
        Bytes::copy_from_slice(&signature.as_bytes())
    }

    async fn explain(message: &[u8], signature: &Bytes, address: Address) -> Option<Diagnosis> {
        let node = MockNode::start(simulated_validator(Vec::new())).await;
        DiagnosticEngine::default()
            .explain_failure(
                &node.provider(),
                &UniversalValidator::default(),
                address,
                message,
                signature,
            )
            .await
    }

    #[test]
    fn test_transforms() {
        assert_eq!(unprefixed_digest(b"abc"), Some(keccak256(b"abc")));
        assert_eq!(hex_message_as_bytes(b"hello"), None);
        assert_eq!(hex_message_as_bytes(b"0x"), None);
        assert_eq!(
            hex_message_as_bytes(b"0xdeadbeef"),
            Some(Digest::personal_message(&[0xde, 0xad, 0xbe, 0xef]).into())
        );
        assert_eq!(hex_message_as_raw_hash(b"0xdeadbeef"), None);
        let hash = B256::repeat_byte(0x42);
        assert_eq!(hex_message_as_raw_hash(hash.to_string().as_bytes()), Some(hash));
    }

    #[test]
    fn test_builtin_order() {
        let labels: Vec<_> = DiagnosticEngine::default()
            .scenarios()
            .iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(
            labels,
            ["missing-prefix", "hex-message-signed-as-bytes", "hex-message-signed-as-raw-hash"]
        );
    }

    #[tokio::test]
    async fn test_missing_prefix_detected() {
        let signer = signer();
        let message = b"Test Test Test";
        let signature = to_bytes(&signer.sign_hash_sync(&keccak256(message)).unwrap());

        let diagnosis = explain(message, &signature, signer.address()).await.unwrap();
        assert_eq!(diagnosis.scenario, "missing-prefix");
    }

    #[tokio::test]
    async fn test_no_diagnosis_when_nothing_validates() {
        let signer = signer();
        let signature = to_bytes(&signer.sign_message_sync(b"something else").unwrap());
        assert_eq!(explain(b"Test Test Test", &signature, signer.address()).await, None);
    }

    #[tokio::test]
    async fn test_hex_message_signed_as_bytes() {
        let signer = signer();
        let signature = to_bytes(&signer.sign_message_sync(&[0xde, 0xad, 0xbe, 0xef]).unwrap());
        let diagnosis = explain(b"0xdeadbeef", &signature, signer.address()).await.unwrap();
        assert_eq!(diagnosis.scenario, "hex-message-signed-as-bytes");
    }

    #[tokio::test]
    async fn test_hex_message_signed_as_raw_hash() {
        let signer = signer();
        let hash = keccak256(b"payload");
        let signature = to_bytes(&signer.sign_hash_sync(&hash).unwrap());
        let diagnosis = explain(hash.to_string().as_bytes(), &signature, signer.address())
            .await
            .unwrap();
        assert_eq!(diagnosis.scenario, "hex-message-signed-as-raw-hash");
    }

    #[tokio::test]
    async fn test_errors_are_inconclusive() {
        let node = MockNode::start(|_: &str, _: &serde_json::Value| {
            RpcReply::Error(-32005, "rate limited".into())
        })
        .await;
        let signer = signer();
        let signature = to_bytes(&signer.sign_hash_sync(&keccak256(b"x")).unwrap());
        let diagnosis = DiagnosticEngine::default()
            .explain_failure(
                &node.provider(),
                &UniversalValidator::default(),
                signer.address(),
                b"x",
                &signature,
            )
            .await;
        assert_eq!(diagnosis, None);
        assert_eq!(node.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_custom_scenario_appended() {
        fn fixed(_: &[u8]) -> Option<B256> {
            Some(B256::repeat_byte(0x07))
        }
        let signer = signer();
        let signature = to_bytes(&signer.sign_hash_sync(&B256::repeat_byte(0x07)).unwrap());
        let engine = DiagnosticEngine::empty().with_scenario(Scenario {
            label: "fixed-hash",
            reason: "signed a constant",
            transform: fixed,
        });
        let node = MockNode::start(simulated_validator(Vec::new())).await;
        let diagnosis = engine
            .explain_failure(
                &node.provider(),
                &UniversalValidator::default(),
                signer.address(),
                b"irrelevant",
                &signature,
            )
            .await
            .unwrap();
        assert_eq!(diagnosis.scenario, "fixed-hash");
        assert_eq!(diagnosis.reason, "signed a constant");
    }
}
