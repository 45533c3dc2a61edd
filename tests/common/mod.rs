//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use news_server::config::ServerConfig;
use news_server::lifecycle::Shutdown;
use news_server::net::Listener;
use news_server::ContentServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

/// Start a server over `data_dir`, letting `tweak` adjust the config.
pub async fn start_server(data_dir: &Path, tweak: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.dataset.data_dir = data_dir.to_path_buf();
    tweak(&mut config);

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = ContentServer::new(&config);
    let signal = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    TestServer { addr, shutdown, handle }
}

/// Send raw bytes and read the whole reply until the server closes.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8(reply).unwrap()
}

/// Write a dataset with `rows` well-formed records named `t0..`.
#[allow(dead_code)]
pub fn write_dataset(dir: &Path, category: &str, rows: usize) {
    let mut content = String::from("title|description|image|url|date\n");
    for i in 0..rows {
        let image = if i % 2 == 0 { "None".to_string() } else { format!("https://img/{i}.jpg") };
        content.push_str(&format!("t{i}|d{i}|{image}|https://news/{i}|2022.07.01. {i}\n"));
    }
    std::fs::write(dir.join(format!("{category}.csv")), content).unwrap();
}
