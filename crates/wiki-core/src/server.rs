//! TCP listener loop: one task per connection, one request per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

use crate::handlers::Wiki;
use crate::http::{self, HttpError, Response};

pub struct Server {
    listener: TcpListener,
    wiki: Arc<Wiki>,
}

impl Server {
    /// Binds `addr` (e.g. `0.0.0.0:8080`, or `127.0.0.1:0` in tests).
    pub async fn bind(addr: &str, wiki: Wiki) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        Ok(Self {
            listener,
            wiki: Arc::new(wiki),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the process exits.
    pub async fn serve(self) -> Result<()> {
        self.serve_until(std::future::pending::<()>()).await
    }

    /// Serves until `shutdown` resolves, then stops accepting. Connections
    /// already handed to a task run to completion on their own.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "wiki listening");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let wiki = Arc::clone(&self.wiki);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, wiki).await {
                                tracing::debug!(%peer, "connection: {}", e);
                            }
                        });
                    }
                    Err(e) => tracing::warn!("accept: {}", e),
                },
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, wiki: Arc<Wiki>) -> Result<(), HttpError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let resp = match http::read_request(&mut reader).await {
        Ok(Some(req)) => {
            // Store and template work is blocking file I/O.
            tokio::task::spawn_blocking(move || wiki.handle(&req))
                .await
                .unwrap_or_else(|e| Response::internal_error(format!("handler panicked: {}", e)))
        }
        Ok(None) => return Ok(()),
        Err(HttpError::Io(e)) => return Err(HttpError::Io(e)),
        Err(e) => Response::bad_request(e.to_string()),
    };

    resp.write_to(&mut write_half).await?;
    Ok(())
}
