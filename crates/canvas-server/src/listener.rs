//! TCP accept loop and WebSocket upgrade, grounded on `ox-bin::AppStartup`'s
//! "do the one-time setup, then hand a long-lived resource to the caller" shape,
//! translated from "enter the terminal, return a `RuntimeContext`" to "bind a port,
//! return a `Listener`".

use crate::config::ServerConfig;
use canvas_session::{Session, SessionContext, SessionOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tracing::{error, info, warn};

/// The embedded bootstrap page served for any plain HTTP GET on the listening port
/// when no `static_dir` override is configured, or when the override has no
/// `index.html`. Generating the browser-side command interpreter is out of scope
/// here; this page is just enough to prove the port answers and to point a
/// developer at `/ws`.
const BOOTSTRAP_HTML: &str = include_str!("bootstrap.html");

pub struct Listener {
    tcp: TcpListener,
    options: SessionOptions,
    static_dir: Option<PathBuf>,
}

impl Listener {
    pub async fn bind(config: &ServerConfig) -> anyhow::Result<Self> {
        let tcp = TcpListener::bind(&config.bind).await?;
        info!(target: "server.accept", bind = config.bind.as_str(), "listening");
        Ok(Self {
            tcp,
            options: SessionOptions {
                width: config.width,
                height: config.height,
                title: config.title.clone(),
                background: config.background,
                event_mask: config.event_mask,
                cursor: config.cursor,
                ..SessionOptions::default()
            },
            static_dir: config.static_dir().map(Path::to_path_buf),
        })
    }

    /// Accepts connections forever. Each one either upgrades to a canvas session
    /// (spawning `entry` as its user task) or gets the static bootstrap page. A
    /// failed `accept()` is logged and retried after a short backoff rather than
    /// ending the loop — the listener's failure domain is per-connection, never
    /// whole-process.
    pub async fn serve<F, Fut>(self, entry: F) -> anyhow::Result<()>
    where
        F: Fn(SessionContext<TcpStream>) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        loop {
            let (tcp, peer) = match self.tcp.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(target: "server.accept", %err, "accept_failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            let options = self.options.clone();
            let static_dir = self.static_dir.clone();
            let entry = entry.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(tcp, options, static_dir, entry).await {
                    error!(target: "server.accept", %peer, %err, "connection_failed");
                }
            });
        }
    }
}

async fn handle_connection<F, Fut>(
    tcp: TcpStream,
    options: SessionOptions,
    static_dir: Option<PathBuf>,
    entry: F,
) -> anyhow::Result<()>
where
    F: Fn(SessionContext<TcpStream>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut peek_buf = [0u8; 512];
    let n = tcp.peek(&mut peek_buf).await?;
    let looks_like_upgrade = peek_buf[..n]
        .windows(7)
        .any(|w| w.eq_ignore_ascii_case(b"upgrade"));

    if !looks_like_upgrade {
        return serve_bootstrap_page(tcp, static_dir).await;
    }

    let ws_stream = accept_async(tcp).await?;
    let session = Session::start(ws_stream, options).await?;
    session.run(entry).await
}

/// Serves `static_dir/index.html` if configured and present, else the embedded
/// bootstrap page.
async fn serve_bootstrap_page(mut tcp: TcpStream, static_dir: Option<PathBuf>) -> anyhow::Result<()> {
    use tokio::io::AsyncWriteExt;

    let body = match static_dir {
        Some(dir) => match tokio::fs::read(dir.join("index.html")).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(target: "server.accept", %err, dir = %dir.display(), "static_index_unavailable_using_embedded");
                BOOTSTRAP_HTML.as_bytes().to_vec()
            }
        },
        None => BOOTSTRAP_HTML.as_bytes().to_vec(),
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    tcp.write_all(response.as_bytes()).await?;
    tcp.write_all(&body).await?;
    tcp.shutdown().await?;
    Ok(())
}
