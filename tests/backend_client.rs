use serde_json::{Value, json};
use setup_wizard::{
    backend_client::{BackendClient, BackendGateway, WifiCredentials},
    storage::{AUTH_TOKEN_KEY, FileStorage, LocalStorage},
};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Integration tests for the backend gateway against a mock HTTP server
#[derive(Debug)]
struct RecordedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

struct MockServer {
    base_url: String,
    requests: mpsc::UnboundedReceiver<RecordedRequest>,
    handle: JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_mock_server(status: u16, response_body: &'static str) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("failed to get local address");
    let (tx, requests) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();

            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.split();
                let mut reader = BufReader::new(read_half);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }

                // Read HTTP headers
                let mut headers = Vec::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.is_err() {
                        return;
                    }

                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }

                    if let Some((name, value)) = line.split_once(':') {
                        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
                    }
                }

                let content_length = headers
                    .iter()
                    .find(|(n, _)| n == "content-length")
                    .and_then(|(_, v)| v.parse::<usize>().ok())
                    .unwrap_or(0);

                let mut body = vec![0; content_length];
                if reader.read_exact(&mut body).await.is_err() {
                    return;
                }

                let _ = tx.send(RecordedRequest {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8_lossy(&body).to_string(),
                });

                let reason = if status < 400 { "OK" } else { "Error" };
                let http_response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response_body.len(),
                    response_body
                );

                let _ = write_half.write_all(http_response.as_bytes()).await;
                let _ = write_half.shutdown().await;
            });
        }
    });

    MockServer {
        base_url: format!("http://{addr}/api"),
        requests,
        handle,
    }
}

/// Base URL of a port nobody listens on
async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn create_gateway(base_url: &str) -> (TempDir, BackendGateway<FileStorage>) {
    let dir = TempDir::new().expect("failed to create temp directory");
    let gateway = BackendGateway::new(base_url, FileStorage::new(dir.path()))
        .expect("failed to create gateway");
    (dir, gateway)
}

fn credentials() -> WifiCredentials {
    WifiCredentials {
        ssid: "home".to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn check_network_returns_status_body() {
    let mut server = start_mock_server(200, r#"{"online":true}"#).await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    let status = gateway.check_network().await;

    assert_eq!(status, Some(json!({"online": true})));
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.request_line, "GET /api/network/status HTTP/1.1");
}

#[tokio::test]
async fn check_network_returns_none_on_server_error() {
    let server = start_mock_server(500, r#"{"error":"boom"}"#).await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    assert_eq!(gateway.check_network().await, None);
}

#[tokio::test]
async fn check_network_returns_none_when_unreachable() {
    let (_dir, gateway) = create_gateway(&unreachable_base_url().await);

    assert_eq!(gateway.check_network().await, None);
}

#[tokio::test]
async fn scan_for_devices_returns_devices_field() {
    let mut server =
        start_mock_server(200, r#"{"devices":[{"ip":"192.168.1.20"},{"ip":"192.168.1.21"}]}"#)
            .await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    let devices = gateway.scan_for_devices().await;

    assert_eq!(
        devices,
        vec![json!({"ip": "192.168.1.20"}), json!({"ip": "192.168.1.21"})]
    );
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.request_line, "GET /api/network/scan HTTP/1.1");
}

#[tokio::test]
async fn scan_for_devices_returns_empty_on_server_error() {
    let server = start_mock_server(500, "internal error").await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    assert!(gateway.scan_for_devices().await.is_empty());
}

#[tokio::test]
async fn scan_for_devices_returns_empty_on_malformed_body() {
    let server = start_mock_server(200, r#"{"devices":"none"}"#).await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    assert!(gateway.scan_for_devices().await.is_empty());
}

#[tokio::test]
async fn connect_to_wifi_posts_credentials() {
    let mut server = start_mock_server(200, r#"{"connected":true}"#).await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    let response = gateway
        .connect_to_wifi(credentials())
        .await
        .expect("connect should succeed");

    assert_eq!(response, json!({"connected": true}));
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.request_line, "POST /api/network/wifi HTTP/1.1");
    assert_eq!(
        serde_json::from_str::<Value>(&request.body).unwrap(),
        json!({"ssid": "home", "password": "secret"})
    );
}

#[tokio::test]
async fn connect_to_wifi_propagates_server_error() {
    let server = start_mock_server(500, r#"{"error":"association failed"}"#).await;
    let (_dir, gateway) = create_gateway(&server.base_url);

    let error = gateway
        .connect_to_wifi(credentials())
        .await
        .expect_err("connect should fail");

    assert!(format!("{error:#}").contains("status 500"));
}

#[tokio::test]
async fn save_network_config_posts_config() {
    let mut server = start_mock_server(200, "").await;
    let (_dir, gateway) = create_gateway(&server.base_url);
    let config = json!({"networkType": "ethernet", "serverIp": "192.168.1.2"});

    let response = gateway
        .save_network_config(config.clone())
        .await
        .expect("save should succeed");

    assert_eq!(response, Value::Null);
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.request_line, "POST /api/network/config HTTP/1.1");
    assert_eq!(serde_json::from_str::<Value>(&request.body).unwrap(), config);
}

#[tokio::test]
async fn save_network_config_propagates_transport_failure() {
    let (_dir, gateway) = create_gateway(&unreachable_base_url().await);

    assert!(gateway.save_network_config(json!({})).await.is_err());
}

#[tokio::test]
async fn authorization_header_follows_token_store() {
    let mut server = start_mock_server(200, "{}").await;
    let (dir, gateway) = create_gateway(&server.base_url);
    let storage = FileStorage::new(dir.path());

    gateway.check_network().await;
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.header("authorization"), None);

    storage.set_item(AUTH_TOKEN_KEY, "agent-key").unwrap();
    gateway.scan_for_devices().await;
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.header("authorization"), Some("Bearer agent-key"));

    gateway.connect_to_wifi(credentials()).await.unwrap();
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.header("authorization"), Some("Bearer agent-key"));

    std::fs::remove_file(dir.path().join(AUTH_TOKEN_KEY)).unwrap();
    gateway.save_network_config(json!({})).await.unwrap();
    let request = server.requests.recv().await.unwrap();
    assert_eq!(request.header("authorization"), None);
}
