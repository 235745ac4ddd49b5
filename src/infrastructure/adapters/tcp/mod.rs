//! TCP adapter - Line-oriented chat over plain sockets

mod codec;
mod session;

pub use codec::{ChatLineCodec, Inbound};
pub use session::SessionWorker;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::application::errors::ChatError;
use crate::application::services::ChatHub;
use crate::infrastructure::config::IdentityMode;

/// Accepts connections and starts one session worker per connection
pub struct TcpAdapter {
    listener: TcpListener,
    hub: Arc<ChatHub>,
    identity: IdentityMode,
}

impl TcpAdapter {
    pub async fn bind(addr: &str, hub: Arc<ChatHub>, identity: IdentityMode) -> Result<Self, ChatError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ChatError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            hub,
            identity,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn hub(&self) -> &Arc<ChatHub> {
        &self.hub
    }

    /// Accept until the listener fails. Only returns on that fatal error.
    pub async fn run(self) -> Result<(), ChatError> {
        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Accept failed, no longer taking connections: {}", e);
                    return Err(ChatError::Accept(e));
                }
            };

            let connection = self.hub.connect(self.identity.key_for(peer));
            tracing::info!(
                "Client {} ({}) {} as {}",
                peer,
                connection.session.id(),
                if connection.rejoined { "rejoined" } else { "connected" },
                connection.session.user()
            );

            let worker = SessionWorker::new(Arc::clone(&self.hub), connection, peer);
            tokio::spawn(worker.run(socket));
        }
    }
}
