//! JSON-RPC node mocks.
//!
//! Wraps mockito with helpers for the methods the provider and the ingestion
//! loop call.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::net::TcpListener;

/// A mocked JSON-RPC node.
pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

fn method_matcher(method: &str) -> Matcher {
    Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
}

fn result_body(result: &Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

impl RpcMockBuilder {
    /// Creates a node backed by a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn respond(&mut self, matcher: Matcher, body: String) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks `eth_blockNumber`.
    pub fn mock_block_number(&mut self, block_number: u64) -> &mut Self {
        self.respond(
            method_matcher("eth_blockNumber"),
            result_body(&json!(format!("0x{block_number:x}"))),
        )
    }

    /// Mocks `eth_getBlockByNumber` for one block number.
    pub fn mock_get_block_by_number(&mut self, block_number: u64, response: &Value) -> &mut Self {
        self.respond(
            Matcher::Regex(format!(
                r#""method"\s*:\s*"eth_getBlockByNumber".*"params"\s*:\s*\["0x{block_number:x}""#
            )),
            result_body(response),
        )
    }

    /// Mocks `eth_getTransactionByHash` for one hash.
    pub fn mock_get_transaction(&mut self, hash: &str, response: &Value) -> &mut Self {
        self.respond(
            Matcher::AllOf(vec![
                method_matcher("eth_getTransactionByHash"),
                Matcher::Regex(format!(r#""params"\s*:\s*\["{hash}"\]"#)),
            ]),
            result_body(response),
        )
    }

    /// Mocks `eth_getLogs` regardless of the filter.
    pub fn mock_get_logs(&mut self, logs: &[Value]) -> &mut Self {
        self.respond(method_matcher("eth_getLogs"), result_body(&json!(logs)))
    }

    /// Mocks any method with a fixed result.
    pub fn mock_method(&mut self, method: &str, result: &Value) -> &mut Self {
        self.respond(method_matcher(method), result_body(result))
    }

    /// Answers `method` with `result: null`, as nodes do for unknown objects.
    pub fn mock_null(&mut self, method: &str) -> &mut Self {
        self.respond(method_matcher(method), result_body(&Value::Null))
    }

    /// Mocks an RPC error response.
    pub fn mock_rpc_error(&mut self, method: &str, code: i32, message: &str) -> &mut Self {
        self.respond(
            method_matcher(method),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": code, "message": message }
            })
            .to_string(),
        )
    }

    /// Answers every request with HTTP 500.
    pub fn mock_server_error(&mut self) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .with_status(500)
            .with_body("Internal Server Error")
            .create();

        self.mocks.push(mock);
        self
    }

    /// Removes every mock registered so far.
    pub fn reset(&mut self) -> &mut Self {
        for mock in self.mocks.drain(..) {
            mock.remove();
        }
        self
    }

    #[must_use]
    pub fn verify_all_called(&self) -> bool {
        self.mocks.iter().all(Mock::matched)
    }
}

/// An endpoint that accepts TCP connections but never answers, so every
/// request to it runs into the caller's timeout.
pub struct SilentNode {
    listener: TcpListener,
}

impl SilentNode {
    /// Binds to a free local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[must_use]
    pub fn bind() -> Self {
        Self { listener: TcpListener::bind("127.0.0.1:0").expect("bind silent node") }
    }

    /// # Panics
    ///
    /// Panics if the listener has no local address.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.listener.local_addr().expect("silent node address"))
    }
}
