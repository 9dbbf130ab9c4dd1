//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use redirect_service::config::{MappingUpdate, RedirectConfig};
use redirect_service::store::BootstrapSource;
use redirect_service::{HttpServer, PathStore, Shutdown};

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: PathStore,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub updates: mpsc::UnboundedSender<MappingUpdate>,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    #[allow(dead_code)]
    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
        result.expect("server returned an error");
    }
}

/// Start a server with the given config and store.
pub async fn start_server(config: RedirectConfig, store: PathStore) -> TestServer {
    start_server_with_source(config, store, BootstrapSource::File).await
}

/// Start a server whose store was bootstrapped from `source`.
pub async fn start_server_with_source(config: RedirectConfig, store: PathStore, source: BootstrapSource) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, update_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, store.clone()).with_bootstrap_source(source);
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, update_rx, server_shutdown).await });

    TestServer {
        addr,
        store,
        shutdown,
        updates,
        handle,
    }
}

/// A client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
