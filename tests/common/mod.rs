//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use gym_gateway::config::GatewayConfig;
use gym_gateway::http::HttpServer;
use gym_gateway::lifecycle::Shutdown;

pub const SECRET: &str = "integration-test-secret";

/// A request seen by a mock downstream service.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
}

pub type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

fn parse_request(raw: &str) -> RecordedRequest {
    let mut lines = raw.split("\r\n");
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();
    RecordedRequest { path, headers }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a programmable downstream service on an ephemeral port.
///
/// `f` receives the request path and returns `(status, json body)`.
pub async fn start_downstream<F, Fut>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder: Recorder = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let rec = recorder.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let f = f.clone();
            let rec = rec.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }

                let request = parse_request(&String::from_utf8_lossy(&buf));
                let path = request.path.clone();
                rec.lock().unwrap().push(request);

                let (status, body) = f(path).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorder)
}

/// Start a downstream service that always answers with the same payload.
pub async fn start_fixed(status: u16, body: &'static str) -> (SocketAddr, Recorder) {
    start_downstream(move |_| async move { (status, body.to_string()) }).await
}

/// Start a downstream service that answers after `delay`.
pub async fn start_slow(delay: Duration, body: &'static str) -> (SocketAddr, Recorder) {
    start_downstream(move |_| async move {
        tokio::time::sleep(delay).await;
        (200, body.to_string())
    })
    .await
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub const MEMBER_JSON: &str =
    r#"{"id":1,"name":"Ana López","email":"ana.lopez@email.com","registrationDate":"2024-01-15"}"#;

pub const CLASSES_JSON: &str = r#"[
    {"id":10,"name":"Yoga Matutino","schedule":"2024-01-15T10:00:00","maxCapacity":20,"currentEnrollment":5,"coachId":3,"enrolledMembers":[1,2]},
    {"id":11,"name":"Spinning","schedule":"2024-01-16T18:30:00","maxCapacity":15,"coachId":4}
]"#;

pub const PAYMENTS_JSON: &str = r#"[
    {"id":100,"memberId":1,"amount":50.00,"paymentDate":"2024-01-15T10:00:00Z"},
    {"id":101,"memberId":1,"amount":25.50,"paymentDate":"2024-02-15T10:00:00Z"}
]"#;

/// Mint an HS256 token signed with [`SECRET`].
pub fn token(claims: serde_json::Value) -> String {
    let mut claims = claims;
    claims["exp"] = serde_json::json!(4_000_000_000u64);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

/// Config pointing the three downstream names at the given addresses.
pub fn gateway_config(member: SocketAddr, class: SocketAddr, payment: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.auth.jwt_secret = Some(SECRET.into());
    config.downstream.timeout_secs = 2;
    for (name, addr) in [
        ("member-microservice", member),
        ("class-microservice", class),
        ("payment-microservice", payment),
    ] {
        config.services.push(gym_gateway::config::ServiceInstanceConfig {
            name: name.into(),
            address: addr.to_string(),
        });
    }
    config
}

/// A running gateway under test.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    gym_gateway::config::validation::validate_config(&config).unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGateway {
        addr,
        shutdown,
        config_tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
