#![allow(clippy::unwrap_used)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes as Body,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use xabi_domain::ChainId;

use crate::{
    AgentError, AgentTransaction, CallParams, ChainRpc, ChainRpcError, EndpointProber,
    SigningAgent, endpoints::SelectedEndpoint,
};

async fn serve(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, handle)
}

// ---------------------------------------------------------------------------
// Plain HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum HttpReply {
    Json(Value),
    Status(u16),
}

struct HttpState {
    reply: HttpReply,
    requests: Mutex<Vec<Uri>>,
}

/// Answers every GET/POST on any path with a fixed reply.
pub(crate) struct FakeHttpServer {
    addr: SocketAddr,
    state: Arc<HttpState>,
    handle: JoinHandle<()>,
}

impl FakeHttpServer {
    pub(crate) async fn start(reply: HttpReply) -> Self {
        let state = Arc::new(HttpState {
            reply,
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .fallback(handle_http)
            .with_state(state.clone());
        let (addr, handle) = serve(router).await;
        Self {
            addr,
            state,
            handle,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub(crate) fn last_path(&self) -> Option<String> {
        self.state
            .requests
            .lock()
            .unwrap()
            .last()
            .map(|uri| uri.path().to_string())
    }

    pub(crate) fn last_query(&self) -> Option<String> {
        self.state
            .requests
            .lock()
            .unwrap()
            .last()
            .and_then(|uri| uri.query().map(str::to_string))
    }
}

impl Drop for FakeHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_http(State(state): State<Arc<HttpState>>, uri: Uri) -> Response {
    state.requests.lock().unwrap().push(uri);
    match &state.reply {
        HttpReply::Json(body) => Json(body.clone()).into_response(),
        HttpReply::Status(code) => StatusCode::from_u16(*code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum RpcBehavior {
    Healthy,
    JsonRpcError,
    HttpStatus(u16),
    Malformed,
    Slow(Duration),
}

#[derive(Debug, Clone)]
pub(crate) enum RpcReply {
    Result(Value),
    Error {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    MethodNotFound,
}

type RpcHandler = Box<dyn Fn(&str, &Value) -> RpcReply + Send + Sync>;

enum RpcMode {
    Handler(RpcHandler),
    HttpStatus(u16),
    Malformed,
}

struct RpcState {
    mode: RpcMode,
    delay: Option<Duration>,
    requests: Mutex<Vec<(String, Value)>>,
}

/// Minimal JSON-RPC node. Records every method and its params.
pub(crate) struct FakeRpcServer {
    addr: SocketAddr,
    state: Arc<RpcState>,
    handle: JoinHandle<()>,
}

impl FakeRpcServer {
    pub(crate) async fn start(behavior: RpcBehavior) -> Self {
        let (mode, delay) = match behavior {
            RpcBehavior::Healthy => (RpcMode::Handler(Box::new(healthy_node)), None),
            RpcBehavior::Slow(delay) => (RpcMode::Handler(Box::new(healthy_node)), Some(delay)),
            RpcBehavior::JsonRpcError => (
                RpcMode::Handler(Box::new(|_, _| RpcReply::Error {
                    code: -32000,
                    message: "header not found".to_string(),
                    data: None,
                })),
                None,
            ),
            RpcBehavior::HttpStatus(code) => (RpcMode::HttpStatus(code), None),
            RpcBehavior::Malformed => (RpcMode::Malformed, None),
        };
        Self::spawn(mode, delay).await
    }

    pub(crate) async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
    {
        Self::spawn(RpcMode::Handler(Box::new(handler)), None).await
    }

    async fn spawn(mode: RpcMode, delay: Option<Duration>) -> Self {
        let state = Arc::new(RpcState {
            mode,
            delay,
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .fallback(handle_rpc)
            .with_state(state.clone());
        let (addr, handle) = serve(router).await;
        Self {
            addr,
            state,
            handle,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn requests_for(&self, method: &str) -> usize {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub(crate) fn last_params(&self, method: &str) -> Option<Value> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }
}

impl Drop for FakeRpcServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn healthy_node(method: &str, _params: &Value) -> RpcReply {
    match method {
        "eth_blockNumber" => RpcReply::Result(json!("0x10")),
        "eth_chainId" => RpcReply::Result(json!("0x1")),
        "net_version" => RpcReply::Result(json!("1")),
        _ => RpcReply::MethodNotFound,
    }
}

async fn handle_rpc(State(state): State<Arc<RpcState>>, body: Body) -> Response {
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request.get("params").cloned().unwrap_or(Value::Null);
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    state
        .requests
        .lock()
        .unwrap()
        .push((method.clone(), params.clone()));

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let handler = match &state.mode {
        RpcMode::HttpStatus(code) => {
            return StatusCode::from_u16(*code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
        RpcMode::Malformed => return (StatusCode::OK, "not json").into_response(),
        RpcMode::Handler(handler) => handler,
    };

    let body = match handler(&method, &params) {
        RpcReply::Result(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        RpcReply::Error {
            code,
            message,
            data,
        } => {
            let mut error = json!({ "code": code, "message": message });
            if let Some(data) = data {
                error["data"] = data;
            }
            json!({ "jsonrpc": "2.0", "id": id, "error": error })
        }
        RpcReply::MethodNotFound => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("the method {method} does not exist") }
        }),
    };
    Json(body).into_response()
}

// ---------------------------------------------------------------------------
// In-process fakes
// ---------------------------------------------------------------------------

/// Prober answering from a fixed table. Unknown URLs are unreachable.
#[derive(Default)]
pub(crate) struct RecordingProber {
    answers: HashMap<String, bool>,
    delays: HashMap<String, Duration>,
    probed: Mutex<Vec<String>>,
}

impl RecordingProber {
    pub(crate) fn new<'a>(answers: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|(url, live)| (url.to_string(), live))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub(crate) fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndpointProber for RecordingProber {
    async fn probe(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.answers.get(url).copied().unwrap_or(false)
    }
}

type CallHandler = Box<dyn Fn(&CallParams) -> Result<Bytes, ChainRpcError> + Send + Sync>;

/// Scripted chain access. Unscripted calls fail, unscripted estimates return 21000.
#[derive(Default)]
pub(crate) struct FakeChainRpc {
    call_handler: Option<CallHandler>,
    call_replies: Mutex<VecDeque<Result<Bytes, ChainRpcError>>>,
    estimate_replies: Mutex<VecDeque<Result<u64, ChainRpcError>>>,
    balance: Mutex<Option<U256>>,
    calls: Mutex<Vec<(SelectedEndpoint, CallParams)>>,
    estimates: Mutex<Vec<(SelectedEndpoint, CallParams)>>,
}

impl FakeChainRpc {
    pub(crate) fn with_call_handler<F>(handler: F) -> Self
    where
        F: Fn(&CallParams) -> Result<Bytes, ChainRpcError> + Send + Sync + 'static,
    {
        Self {
            call_handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    pub(crate) fn push_call(&self, reply: Result<Bytes, ChainRpcError>) {
        self.call_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn push_estimate(&self, reply: Result<u64, ChainRpcError>) {
        self.estimate_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn set_balance(&self, balance: Option<U256>) {
        *self.balance.lock().unwrap() = balance;
    }

    pub(crate) fn calls(&self) -> Vec<(SelectedEndpoint, CallParams)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn estimates(&self) -> Vec<(SelectedEndpoint, CallParams)> {
        self.estimates.lock().unwrap().clone()
    }
}

fn unscripted() -> ChainRpcError {
    ChainRpcError::Request {
        message: "no scripted response".to_string(),
        source: None,
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn call(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<Bytes, ChainRpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.clone(), params.clone()));
        if let Some(handler) = &self.call_handler {
            return handler(params);
        }
        self.call_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn estimate_gas(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<u64, ChainRpcError> {
        self.estimates
            .lock()
            .unwrap()
            .push((endpoint.clone(), params.clone()));
        self.estimate_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(21_000))
    }

    async fn get_balance(
        &self,
        _endpoint: &SelectedEndpoint,
        _address: Address,
    ) -> Result<U256, ChainRpcError> {
        (*self.balance.lock().unwrap()).ok_or_else(unscripted)
    }
}

/// Signing agent with canned answers that records what it was asked to send.
pub(crate) struct FakeAgent {
    accounts: Vec<Address>,
    chain_id: Mutex<ChainId>,
    response: Mutex<Result<Option<String>, AgentError>>,
    sent: Mutex<Vec<AgentTransaction>>,
    switches: Mutex<Vec<ChainId>>,
}

impl FakeAgent {
    pub(crate) fn new(account: Address, chain_id: ChainId) -> Self {
        Self {
            accounts: vec![account],
            chain_id: Mutex::new(chain_id),
            response: Mutex::new(Ok(Some(format!("0x{}", "ab".repeat(32))))),
            sent: Mutex::new(Vec::new()),
            switches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn without_accounts(mut self) -> Self {
        self.accounts.clear();
        self
    }

    pub(crate) fn respond_with(&self, response: Result<Option<String>, AgentError>) {
        *self.response.lock().unwrap() = response;
    }

    pub(crate) fn sent(&self) -> Vec<AgentTransaction> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn switches(&self) -> Vec<ChainId> {
        self.switches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SigningAgent for FakeAgent {
    async fn request_accounts(&self) -> Result<Vec<Address>, AgentError> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, AgentError> {
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), AgentError> {
        self.switches.lock().unwrap().push(chain_id);
        *self.chain_id.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn send_transaction(&self, tx: &AgentTransaction) -> Result<Option<String>, AgentError> {
        self.sent.lock().unwrap().push(tx.clone());
        self.response.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// ERC-20 style ABI with one function of each kind.
pub(crate) fn token_abi() -> &'static str {
    r#"[
        {"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
        {"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"allowance","inputs":[{"name":"owner","type":"address"},{"name":"spender","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"deposit","inputs":[],"outputs":[],"stateMutability":"payable"},
        {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
    ]"#
}

/// One ABI-encoded `uint256` return word.
pub(crate) fn uint_word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}
