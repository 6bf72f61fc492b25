//! JSON-RPC node doubles shared by the unit tests.

use alloy_primitives::{Address, B256, Bytes, Signature, address, bytes, hex};
use alloy_sol_types::{SolCall, SolType, sol_data};
use ethsig::NetworkEndpoint;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::contract::{VALIDATE_SIG_OFFCHAIN_BYTECODE, Validator6492};
use crate::provider::{ReadProvider, TransportConfig, connect};

/// Externally owned account behind the fixtures below.
pub const EOA: Address = address!("b016e66D421261FD0078a3b8dd4db640184B93fc");
pub const EOA_MESSAGE: &[u8] = b"test test test";
pub const EOA_MESSAGE_SIG: Bytes = bytes!(
    "d2126d0d9366b6dc1789a356dabadebfa6206e9077cce6220f28cc7cc4d337b04dd22016059a98fee7f35609d5138c28b6c3b179b15d8a65b5f0c3adde967f2b1c"
);
/// Throwaway key for signing fresh fixtures.
pub const TEST_KEY: &str = "0x465d0d758d8c7664d9e1bfa46fb5fb8e27265cb4bc28c0f7752d596910545028";

/// What the mock node answers to one JSON-RPC request.
#[derive(Debug)]
pub enum RpcReply {
    Result(Value),
    Error(i64, String),
}

/// A wiremock server speaking just enough JSON-RPC. Request ids are echoed.
#[derive(Debug)]
pub struct MockNode {
    server: MockServer,
}

impl MockNode {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
    {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                let id = body["id"].clone();
                let reply = handler(body["method"].as_str().unwrap_or_default(), &body["params"]);
                let payload = match reply {
                    RpcReply::Result(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                    RpcReply::Error(code, message) => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": code, "message": message }
                    }),
                };
                ResponseTemplate::new(200).set_body_json(payload)
            })
            .mount(&server)
            .await;
        Self { server }
    }

    /// A node that answers every request with a bare HTTP `status`.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn endpoint(&self, selector: &str) -> NetworkEndpoint {
        NetworkEndpoint {
            selector: selector.to_owned(),
            name: selector.to_owned(),
            chain_id: None,
            url: Url::parse(&self.server.uri()).unwrap(),
        }
    }

    pub fn provider(&self) -> ReadProvider {
        connect(&self.endpoint("mock"), &TransportConfig::default()).unwrap()
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Every validation `eth_call` received so far, decoded.
    pub async fn validation_calls(&self) -> Vec<ValidationCall> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter(|body| body["method"] == "eth_call")
            .filter_map(|body| ValidationCall::decode(&body["params"]))
            .collect()
    }
}

type ConstructorArgs = (sol_data::Address, sol_data::FixedBytes<32>, sol_data::Bytes);

/// A validation request as the node sees it.
#[derive(Debug)]
pub struct ValidationCall {
    /// `true` for creation code with no `to`.
    pub deployless: bool,
    pub signer: Address,
    pub hash: B256,
    pub signature: Bytes,
}

impl ValidationCall {
    /// Decodes the transaction in `eth_call` params for either validator form.
    pub fn decode(params: &Value) -> Option<Self> {
        let tx = &params[0];
        let input = tx.get("input").or_else(|| tx.get("data")).and_then(Value::as_str)?;
        let input = hex::decode(input).ok()?;
        let to = tx.get("to").filter(|to| !to.is_null());
        if to.is_some() {
            let call = Validator6492::isValidSigWithSideEffectsCall::abi_decode(&input).ok()?;
            return Some(Self {
                deployless: false,
                signer: call.signer,
                hash: call.hash,
                signature: call.signature,
            });
        }
        let args = input.strip_prefix(&VALIDATE_SIG_OFFCHAIN_BYTECODE[..])?;
        let (signer, hash, signature) = ConstructorArgs::abi_decode_params(args).ok()?;
        Some(Self {
            deployless: true,
            signer,
            hash,
            signature,
        })
    }
}

/// ABI-encoded `bool` as returned by `isValidSigWithSideEffects`.
pub fn word(valid: bool) -> Value {
    json!(B256::with_last_byte(u8::from(valid)))
}

/// Returns `signature` with the hex nibble at `index` changed.
pub fn flip_nibble(signature: &[u8], index: usize) -> Bytes {
    let mut out = signature.to_vec();
    out[index / 2] ^= if index % 2 == 0 { 0x10 } else { 0x01 };
    out.into()
}

/// Simulates the universal validator in both forms. Deployed calls answer
/// with an ABI word, creation code with a single byte.
///
/// `contracts` lists `(wallet, hash, signature)` triples that the wallet's
/// `isValidSignature` accepts; those wallets also report code. Any other
/// address is treated as code-less and checked by ECDSA recovery.
pub fn simulated_validator(
    contracts: Vec<(Address, B256, Bytes)>,
) -> impl Fn(&str, &Value) -> RpcReply + Send + Sync + 'static {
    move |method: &str, params: &Value| match method {
        "eth_call" => match ValidationCall::decode(params) {
            Some(call) if call.deployless => {
                let verdict = if simulate(&contracts, &call) { "0x01" } else { "0x00" };
                RpcReply::Result(json!(verdict))
            }
            Some(call) => RpcReply::Result(word(simulate(&contracts, &call))),
            None => RpcReply::Error(3, "execution reverted".into()),
        },
        "eth_getCode" => {
            let target: Option<Address> = serde_json::from_value(params[0].clone()).ok();
            let has_code = target.is_some_and(|t| contracts.iter().any(|(a, ..)| *a == t));
            RpcReply::Result(json!(if has_code { "0x6080" } else { "0x" }))
        }
        _ => RpcReply::Error(-32601, format!("the method {method} does not exist")),
    }
}

fn simulate(contracts: &[(Address, B256, Bytes)], call: &ValidationCall) -> bool {
    let signature = ethsig::wrapper::unwrap(&call.signature)
        .map_or_else(|_| call.signature.clone(), |wrapped| wrapped.inner);
    if let Some((_, hash, expected)) = contracts.iter().find(|(a, ..)| *a == call.signer) {
        return *hash == call.hash && *expected == signature;
    }
    Signature::from_raw(&signature)
        .ok()
        .and_then(|s| s.recover_address_from_prehash(&call.hash).ok())
        .is_some_and(|recovered| recovered == call.signer)
}
