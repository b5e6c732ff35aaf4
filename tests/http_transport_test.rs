use serde_json::json;
use solana_rpc_lite::{
    Error, HttpTransport, RpcTransport, SolanaClient, TransactionOptions, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWNER: &str = "DYw8jCTfwHNRJhhmFcbXvVDTqWMEVFBX6ZKUmG5CNSKK";

#[tokio::test]
async fn sends_json_rpc_envelope_and_returns_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "method": "getBalance",
            "params": [OWNER, { "commitment": "finalized" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 1 }, "value": 123456789 },
            "id": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(mock_server.uri()).unwrap();
    assert_eq!(transport.url(), mock_server.uri());
    let result = transport
        .invoke("getBalance", json!([OWNER, { "commitment": "finalized" }]))
        .await
        .unwrap();

    assert_eq!(result["value"], 123456789);
}

#[tokio::test]
async fn json_rpc_error_member_is_response_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": { "code": -32602, "message": "Invalid params: invalid owner address" },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(mock_server.uri()).unwrap();
    let err = transport.invoke("getBalance", json!([])).await.unwrap_err();

    match err {
        TransportError::Response { code, message } => {
            assert_eq!(code, -32602);
            assert!(message.contains("invalid owner"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(mock_server.uri()).unwrap();
    let err = transport.invoke("getBalance", json!([])).await.unwrap_err();

    assert!(matches!(err, TransportError::Http { status: 503, ref body } if body == "upstream unavailable"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(mock_server.uri()).unwrap();
    let err = transport.invoke("getBalance", json!([])).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn slow_node_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "result": 1, "id": 1 }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let transport =
        HttpTransport::with_timeout(mock_server.uri(), Duration::from_millis(200)).unwrap();
    let err = transport.invoke("getSlot", json!([])).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
}

#[tokio::test]
async fn unreachable_node_is_connection_error() {
    // Nothing listens on port 1.
    let transport = HttpTransport::new("http://127.0.0.1:1").unwrap();
    let err = transport.invoke("getSlot", json!([])).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)));
}

#[tokio::test]
async fn client_reports_missing_transaction_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getTransaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": null,
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let client = SolanaClient::with_transport(Arc::new(HttpTransport::new(mock_server.uri()).unwrap()));
    let signature = bs58::encode([3u8; 64]).into_string();
    let err = client
        .get_transaction(&signature, TransactionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TransactionNotFound(_)));
}

#[tokio::test]
async fn client_maps_transaction_over_http() {
    let mock_server = MockServer::start().await;
    let signature = bs58::encode([4u8; 64]).into_string();
    let recipient = "8qbHbw2BbbTHBW1sbeqakYXVKRQM8Ne7pLK7m6CVfeR";

    Mock::given(method("POST"))
        .and(body_string_contains("getTransaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": {
                "slot": 123456,
                "blockTime": 1678888888,
                "version": "legacy",
                "transaction": {
                    "signatures": [signature],
                    "message": {
                        "accountKeys": [OWNER, recipient, "11111111111111111111111111111111"],
                        "instructions": [],
                        "recentBlockhash": "11111111111111111111111111111111"
                    }
                },
                "meta": {
                    "err": null,
                    "status": { "Ok": null },
                    "fee": 5000,
                    "preBalances": [10_000_000_000u64, 0, 1],
                    "postBalances": [9_499_995_000u64, 500_000_000, 1],
                    "innerInstructions": [],
                    "logMessages": [],
                    "preTokenBalances": [],
                    "postTokenBalances": [],
                    "rewards": []
                }
            },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let client = SolanaClient::with_transport(Arc::new(HttpTransport::new(mock_server.uri()).unwrap()));
    let result = client
        .get_transaction(
            &signature,
            TransactionOptions::default().from_pk(OWNER).to_pk(recipient),
        )
        .await
        .unwrap();

    assert_eq!(result.send_sol_amount(), Some(500_005_000));
    assert_eq!(result.sol_amount(), Some(500_000_000));
}

#[tokio::test]
async fn envelope_without_result_or_error_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1 })),
        )
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(mock_server.uri()).unwrap();
    let err = transport.invoke("getSlot", json!([])).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(ref msg) if msg.contains("neither result nor error")));
}

#[tokio::test]
async fn client_treats_missing_result_as_rpc_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getTransaction"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1 })),
        )
        .mount(&mock_server)
        .await;

    let client = SolanaClient::with_transport(Arc::new(HttpTransport::new(mock_server.uri()).unwrap()));
    let signature = bs58::encode([5u8; 64]).into_string();
    let err = client
        .get_transaction(&signature, TransactionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rpc(TransportError::Decode(_))));
}

#[tokio::test]
async fn solana_rpc_client_serves_as_transport() {
    use solana_client::nonblocking::rpc_client::RpcClient;

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 7 }, "value": 2_039_280 },
            "id": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SolanaClient::with_transport(Arc::new(RpcClient::new(mock_server.uri())));
    let balance = client.get_balance(OWNER, None).await.unwrap();

    assert_eq!(balance.slot, 7);
    assert_eq!(balance.lamports, 2_039_280);
}

#[tokio::test]
async fn solana_rpc_client_refuses_by_name_params() {
    use solana_client::nonblocking::rpc_client::RpcClient;

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = SolanaClient::with_transport(Arc::new(RpcClient::new(mock_server.uri())));
    let err = client
        .get_token_accounts(OWNER, Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rpc(TransportError::Unsupported(_))));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn solana_rpc_client_maps_response_errors() {
    use solana_client::nonblocking::rpc_client::RpcClient;

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": { "code": -32601, "message": "Method not found" },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let transport = RpcClient::new(mock_server.uri());
    let err = transport.invoke("getTokenAccounts", json!([])).await.unwrap_err();
    assert!(matches!(err, TransportError::Response { code: -32601, .. }));
}
