//! Per-connection session worker

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::FramedRead;

use super::codec::{ChatLineCodec, Inbound};
use crate::application::messaging::Dispatch;
use crate::application::services::{ChatHub, Connection, Departure};
use crate::domain::entities::Session;

/// Drives one session: initial sync, then reads lines, log updates and
/// outbox notices until the peer leaves.
pub struct SessionWorker {
    hub: Arc<ChatHub>,
    session: Session,
    outbox: mpsc::Receiver<String>,
    peer: SocketAddr,
}

impl SessionWorker {
    pub fn new(hub: Arc<ChatHub>, connection: Connection, peer: SocketAddr) -> Self {
        Self {
            hub,
            session: connection.session,
            outbox: connection.outbox,
            peer,
        }
    }

    /// Serve the stream until end of input, an I/O fault or the exit command
    pub async fn run<S>(mut self, stream: S) -> Session
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut frames = FramedRead::new(reader, ChatLineCodec::new(self.hub.settings().max_line_bytes));
        let mut updates = self.hub.log().subscribe();

        self.session.activate();

        let departure = match self.serve(&mut frames, &mut writer, &mut updates).await {
            Ok(departure) => departure,
            Err(e) => {
                tracing::debug!("[{}] {} connection fault: {}", self.session.id(), self.peer, e);
                Departure::Lost
            }
        };

        self.hub.disconnect(&mut self.session, departure);
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("[{}] shutdown failed: {}", self.session.id(), e);
        }
        self.session.close();

        tracing::info!(
            "Client '{}' ({}) {}",
            self.session.user(),
            self.peer,
            match departure {
                Departure::Lost => "disconnected",
                Departure::Exited => "exited",
            }
        );
        self.session
    }

    async fn serve<R, W>(
        &mut self,
        frames: &mut FramedRead<R, ChatLineCodec>,
        writer: &mut W,
        updates: &mut watch::Receiver<usize>,
    ) -> io::Result<Departure>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.flush(writer).await?;

        loop {
            tokio::select! {
                frame = frames.next() => {
                    let dispatch = match frame {
                        None => return Ok(Departure::Lost),
                        Some(Err(e)) => return Err(e),
                        Some(Ok(Inbound::Line(line))) => {
                            self.hub.handle_line(&mut self.session, &line, Instant::now())
                        }
                        Some(Ok(Inbound::TooLong)) => self.hub.handle_oversized(&mut self.session, Instant::now()),
                    };

                    match dispatch {
                        Dispatch::Reply(lines) => write_lines(writer, &lines).await?,
                        Dispatch::Exit(lines) => {
                            // Announced as an exit already.
                            if let Err(e) = write_lines(writer, &lines).await {
                                tracing::debug!("[{}] farewell not delivered: {}", self.session.id(), e);
                            }
                            return Ok(Departure::Exited);
                        }
                        Dispatch::Dropped | Dispatch::Ignored | Dispatch::Posted(_) => {}
                    }
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        // Log dropped: the hub is gone.
                        return Ok(Departure::Lost);
                    }
                    self.flush(writer).await?;
                }
                Some(notice) = self.outbox.recv() => {
                    write_lines(writer, &[notice]).await?;
                }
            }
        }
    }

    /// Deliver everything past the cursor
    async fn flush<W: AsyncWrite + Unpin>(&mut self, writer: &mut W) -> io::Result<()> {
        let lines = self.hub.render_unseen(&mut self.session);
        if lines.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            "[{}] flushing {} message(s), cursor now {}",
            self.session.id(),
            lines.len(),
            self.session.cursor()
        );
        write_lines(writer, &lines).await
    }
}

async fn write_lines<W: AsyncWrite + Unpin>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    let mut batch = lines.join("\n");
    batch.push('\n');
    writer.write_all(batch.as_bytes()).await?;
    writer.flush().await
}
