//! Axum route handlers for the debugger service.
//!
//! Every handler parses its input strictly before touching the network, so a
//! malformed address or signature is rejected without an RPC round trip.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use axum::Json;
use axum::extract::State;
use ethsig::TypedDataSchema;
use ethsig::input::{parse_address, parse_message_bytes, parse_signature};
use ethsig_evm::{Diagnosis, SignatureVerifier, ValidationResult, WalletClassification};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Shared application state for the debugger service.
pub type DebuggerState = Arc<SignatureVerifier>;

/// Shown by `/debug` for a valid signature.
pub const VALID_MESSAGE: &str = "Signature is valid!";
/// Shown by `/debug` for an invalid signature with no diagnosis.
pub const INVALID_MESSAGE: &str = "Signature is not valid.";

/// Body of `/validate` and `/debug`. Exactly one of `message` and
/// `typedData` must be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    /// Claimed signer, `0x`-prefixed.
    pub address: String,
    /// Network selector.
    pub network: String,
    /// Personal message text.
    #[serde(default)]
    pub message: Option<String>,
    /// EIP-712 payload.
    #[serde(default)]
    pub typed_data: Option<Value>,
    /// Signature, `0x`-prefixed.
    pub signature: String,
}

enum Payload {
    Message(Bytes),
    TypedData(Box<TypedDataSchema>),
}

impl SignatureRequest {
    fn payload(&self) -> Result<Payload, ApiError> {
        match (&self.message, &self.typed_data) {
            (Some(message), None) => Ok(Payload::Message(parse_message_bytes(message))),
            (None, Some(typed_data)) => TypedDataSchema::deserialize(typed_data)
                .map(|schema| Payload::TypedData(Box::new(schema)))
                .map_err(|e| ApiError::InvalidRequest(format!("invalid typed data: {e}"))),
            (Some(_), Some(_)) => Err(ApiError::InvalidRequest(
                "provide either message or typedData, not both".into(),
            )),
            (None, None) => Err(ApiError::InvalidRequest(
                "one of message or typedData is required".into(),
            )),
        }
    }
}

async fn verify(
    verifier: &SignatureVerifier,
    request: &SignatureRequest,
) -> Result<ValidationResult, ApiError> {
    let address: Address = parse_address(&request.address)?;
    let signature = parse_signature(&request.signature)?;
    let result = match request.payload()? {
        Payload::Message(message) => {
            verifier
                .verify_message(&request.network, address, &message, &signature)
                .await?
        }
        Payload::TypedData(schema) => {
            verifier
                .verify_typed_data(&request.network, address, &schema, &signature)
                .await?
        }
    };
    Ok(result)
}

/// Response of `/validate`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the signature is valid.
    pub is_valid: bool,
}

/// Response of `/debug`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// Likely signing mistake, for failed personal messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
    /// Human-readable summary.
    pub message: String,
}

impl From<ValidationResult> for DebugResponse {
    fn from(result: ValidationResult) -> Self {
        let message = match (&result.diagnosis, result.is_valid) {
            (_, true) => VALID_MESSAGE.to_owned(),
            (Some(diagnosis), false) => diagnosis.reason.clone(),
            (None, false) => INVALID_MESSAGE.to_owned(),
        };
        Self {
            is_valid: result.is_valid,
            diagnosis: result.diagnosis,
            message,
        }
    }
}

/// Body of `/classify`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    /// Address to classify.
    pub address: String,
    /// Optional signature, only inspected for the EIP-6492 suffix.
    #[serde(default)]
    pub signature: Option<String>,
}

/// Response of `/classify`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    #[serde(flatten)]
    classification: WalletClassification,
    needs_network_selector: bool,
}

/// One entry of `/networks`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    selector: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_id: Option<u64>,
}

/// `POST /validate` - verdict only.
///
/// # Errors
///
/// `400` on bad input or an unknown network, `502`/`503` on node failures.
pub async fn post_validate(
    State(verifier): State<DebuggerState>,
    Json(request): Json<SignatureRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let result = verify(&verifier, &request).await?;
    Ok(Json(ValidateResponse {
        is_valid: result.is_valid,
    }))
}

/// `POST /debug` - verdict plus an explanation.
///
/// # Errors
///
/// Same as [`post_validate`].
pub async fn post_debug(
    State(verifier): State<DebuggerState>,
    Json(request): Json<SignatureRequest>,
) -> Result<Json<DebugResponse>, ApiError> {
    let result = verify(&verifier, &request).await?;
    tracing::debug!(
        network = %request.network,
        is_valid = result.is_valid,
        diagnosis = result.diagnosis.as_ref().map(|d| d.scenario),
        "debugged signature"
    );
    Ok(Json(result.into()))
}

/// `POST /classify` - wallet kind across every configured network.
///
/// # Errors
///
/// `400` on a malformed address or signature.
pub async fn post_classify(
    State(verifier): State<DebuggerState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let address = parse_address(&request.address)?;
    let signature = request.signature.as_deref().map(parse_signature).transpose()?;
    let classification = verifier.classify(address, signature.as_deref().map(|v| &**v)).await;
    Ok(Json(ClassifyResponse {
        needs_network_selector: classification.needs_network_selector(),
        classification,
    }))
}

/// `GET /networks` - configured networks in order. URLs are omitted since
/// they may carry credentials.
pub async fn get_networks(State(verifier): State<DebuggerState>) -> Json<Vec<NetworkSummary>> {
    Json(
        verifier
            .networks()
            .map(|endpoint| NetworkSummary {
                selector: endpoint.selector.clone(),
                name: endpoint.name.clone(),
                chain_id: endpoint.chain_id,
            })
            .collect(),
    )
}

/// `GET /health`
pub async fn get_health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates an Axum [`axum::Router`] with all debugger endpoints.
pub fn debugger_router(state: DebuggerState) -> axum::Router {
    axum::Router::new()
        .route("/validate", axum::routing::post(post_validate))
        .route("/debug", axum::routing::post(post_debug))
        .route("/classify", axum::routing::post(post_classify))
        .route("/networks", axum::routing::get(get_networks))
        .route("/health", axum::routing::get(get_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_primitives::B256;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use ethsig::NetworkEndpoint;
    use ethsig_evm::provider::connect;
    use ethsig_evm::{TransportConfig, UniversalValidator};
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const ADDRESS: &str = "0xb016e66d421261fd0078a3b8dd4db640184b93fc";
    const SIGNATURE: &str = "0xd2126d0d9366b6dc1789a356dabadebfa6206e9077cce6220f28cc7cc4d337b04dd22016059a98fee7f35609d5138c28b6c3b179b15d8a65b5f0c3adde967f2b1c";

    /// A node whose n-th `eth_call` answers `verdicts[n]` (the last one
    /// repeats) and whose `eth_getCode` answers `code`.
    async fn node(verdicts: Vec<bool>, code: &'static str) -> MockServer {
        let server = MockServer::start().await;
        let calls = AtomicUsize::new(0);
        Mock::given(method("POST"))
            .respond_with(move |request: &wiremock::Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let result = match body["method"].as_str().unwrap() {
                    "eth_getCode" => json!(code),
                    _ => {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        let verdict = verdicts[n.min(verdicts.len() - 1)];
                        json!(B256::with_last_byte(u8::from(verdict)))
                    }
                };
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": result }))
            })
            .mount(&server)
            .await;
        server
    }

    fn app(servers: &[(&str, &MockServer)]) -> axum::Router {
        let verifier = servers.iter().fold(
            SignatureVerifier::new(UniversalValidator::default()),
            |verifier, (selector, server)| {
                let endpoint = NetworkEndpoint {
                    selector: (*selector).to_owned(),
                    name: selector.to_uppercase(),
                    chain_id: Some(1),
                    url: Url::parse(&server.uri()).unwrap(),
                };
                let provider = connect(&endpoint, &TransportConfig::default()).unwrap();
                verifier.with_network(endpoint, provider)
            },
        );
        debugger_router(Arc::new(verifier))
    }

    async fn send(app: axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn message_body(network: &str, message: &str) -> Value {
        json!({
            "address": ADDRESS,
            "network": network,
            "message": message,
            "signature": SIGNATURE,
        })
    }

    #[tokio::test]
    async fn test_validate_message() {
        let server = node(vec![true], "0x").await;
        let (status, body) = send(
            app(&[("mainnet", &server)]),
            Method::POST,
            "/validate",
            Some(message_body("mainnet", "test test test")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isValid": true }));
    }

    #[tokio::test]
    async fn test_validate_typed_data() {
        let server = node(vec![true], "0x").await;
        let body = json!({
            "address": ADDRESS,
            "network": "mainnet",
            "typedData": {
                "types": { "Mail": [{ "name": "contents", "type": "string" }] },
                "domain": { "name": "Ether Mail", "chainId": 1 },
                "message": { "contents": "Hello, Bob!" },
            },
            "signature": SIGNATURE,
        });
        let (status, body) =
            send(app(&[("mainnet", &server)]), Method::POST, "/validate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isValid": true }));
    }

    #[tokio::test]
    async fn test_invalid_typed_data_is_bad_request() {
        let server = node(vec![true], "0x").await;
        let body = json!({
            "address": ADDRESS,
            "network": "mainnet",
            "typedData": {
                "types": { "Mail": [{ "name": "from", "type": "Person" }] },
                "message": {},
            },
            "signature": SIGNATURE,
        });
        let (status, body) =
            send(app(&[("mainnet", &server)]), Method::POST, "/validate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid typed data"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debug_valid() {
        let server = node(vec![true], "0x").await;
        let (status, body) = send(
            app(&[("mainnet", &server)]),
            Method::POST,
            "/debug",
            Some(message_body("mainnet", "test test test")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isValid": true, "message": VALID_MESSAGE }));
    }

    #[tokio::test]
    async fn test_debug_reports_diagnosis() {
        let server = node(vec![false, true], "0x").await;
        let (status, body) = send(
            app(&[("mainnet", &server)]),
            Method::POST,
            "/debug",
            Some(message_body("mainnet", "hello")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], json!(false));
        assert_eq!(body["diagnosis"]["scenario"], json!("missing-prefix"));
        assert_eq!(body["message"], body["diagnosis"]["reason"]);
    }

    #[tokio::test]
    async fn test_debug_without_diagnosis() {
        let server = node(vec![false], "0x").await;
        let (status, body) = send(
            app(&[("mainnet", &server)]),
            Method::POST,
            "/debug",
            Some(message_body("mainnet", "hello")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isValid": false, "message": INVALID_MESSAGE }));
    }

    #[tokio::test]
    async fn test_bad_input_never_reaches_node() {
        let server = node(vec![true], "0x").await;
        let cases = [
            json!({ "address": "0x1234", "network": "mainnet", "message": "m", "signature": SIGNATURE }),
            json!({ "address": ADDRESS, "network": "mainnet", "message": "m", "signature": "0xzz" }),
            json!({ "address": ADDRESS, "network": "mainnet", "signature": SIGNATURE }),
            json!({
                "address": ADDRESS,
                "network": "mainnet",
                "message": "m",
                "typedData": {},
                "signature": SIGNATURE,
            }),
            message_body("solana", "m"),
        ];
        for case in cases {
            let (status, body) =
                send(app(&[("mainnet", &server)]), Method::POST, "/validate", Some(case)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(body["error"].is_string());
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_node_failures_map_to_gateway_errors() {
        let erroring = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|request: &wiremock::Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "error": { "code": -32000, "message": "header not found" },
                }))
            })
            .mount(&erroring)
            .await;
        let down = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&down)
            .await;

        let router = app(&[("mainnet", &erroring), ("polygon", &down)]);
        let (status, _) = send(
            router.clone(),
            Method::POST,
            "/validate",
            Some(message_body("mainnet", "m")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let (status, _) =
            send(router, Method::POST, "/validate", Some(message_body("polygon", "m"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_classify() {
        let deployed = node(vec![true], "0x6080").await;
        let empty = node(vec![true], "0x").await;
        let router = app(&[("mainnet", &empty), ("polygon", &deployed)]);

        let (status, body) = send(
            router.clone(),
            Method::POST,
            "/classify",
            Some(json!({ "address": ADDRESS })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "kind": "deployedContract",
                "deployedOn": ["polygon"],
                "needsNetworkSelector": true,
            })
        );

        let (status, _) = send(
            router,
            Method::POST,
            "/classify",
            Some(json!({ "address": ADDRESS, "signature": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_networks_and_health() {
        let a = node(vec![true], "0x").await;
        let b = node(vec![true], "0x").await;
        let router = app(&[("polygon", &a), ("mainnet", &b)]);

        let (status, body) = send(router.clone(), Method::GET, "/networks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "selector": "polygon", "name": "POLYGON", "chainId": 1 },
                { "selector": "mainnet", "name": "MAINNET", "chainId": 1 },
            ])
        );

        let (status, body) = send(router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
    }
}
