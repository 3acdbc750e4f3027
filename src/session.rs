use crate::error::{CobbleError, Result};
use crate::logger::{log, LogSeverity};
use crate::protocol::{ClientPacket, Frame, ServerCodec, ServerPacket};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::io::{self, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

const INBOUND_QUEUE: usize = 32;
const OUTBOUND_QUEUE: usize = 128;

/// One client connection. A reader task decodes inbound packets and a writer task encodes
/// outbound ones, so neither direction waits on the other. When either task ends, for any
/// reason, the other is stopped and the stream is dropped.
#[derive(Debug)]
pub struct Connection {
    /// Session id, -1 until the registry assigns one
    pub id: i32,
    /// Set at login
    pub username: String,
    pub peer: SocketAddr,
    inbound: mpsc::Receiver<ClientPacket>,
    outbound: mpsc::Sender<ServerPacket>,
    closed: watch::Receiver<bool>,
}

enum Finished {
    Reader(std::result::Result<Result<()>, tokio::task::JoinError>),
    Writer(std::result::Result<Result<()>, tokio::task::JoinError>),
}

impl Connection {
    pub fn spawn<S>(stream: S, peer: SocketAddr) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = io::split(stream);
        let (event_sender, inbound) = mpsc::channel(INBOUND_QUEUE);
        let (outbound, command_receiver) = mpsc::channel(OUTBOUND_QUEUE);
        let (closed_sender, closed) = watch::channel(false);

        let reader = tokio::spawn(read_loop(
            FramedRead::new(read_half, ServerCodec),
            event_sender,
            peer,
        ));
        let writer = tokio::spawn(write_loop(
            FramedWrite::new(write_half, ServerCodec),
            command_receiver,
            peer,
        ));
        tokio::spawn(supervise(reader, writer, peer, closed_sender));

        Connection {
            id: -1,
            username: String::new(),
            peer,
            inbound,
            outbound,
            closed,
        }
    }

    /// Next decoded packet, or `None` once the connection is gone.
    pub async fn next_packet(&mut self) -> Option<ClientPacket> {
        self.inbound.recv().await
    }

    /// Queues a packet. Packets are written in the order they were queued.
    pub async fn send(&self, packet: ServerPacket) -> Result<()> {
        self.outbound
            .send(packet)
            .await
            .map_err(|_| CobbleError::ChannelClosed("connection writer"))
    }

    /// Resolves once both I/O tasks have stopped.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Name for log lines: the username once known, otherwise the peer address.
    pub fn describe(&self) -> String {
        if self.username.is_empty() {
            self.peer.to_string()
        } else {
            format!("{} ({})", self.username, self.peer)
        }
    }
}

async fn read_loop<S: AsyncRead>(
    mut frames: FramedRead<ReadHalf<S>, ServerCodec>,
    events: mpsc::Sender<ClientPacket>,
    peer: SocketAddr,
) -> Result<()> {
    while let Some(frame) = frames.next().await {
        match frame? {
            Frame::Known(packet) => {
                if events.send(packet).await.is_err() {
                    break;
                }
            }
            Frame::Unknown(packet_id) => log(
                format!(
                    "Unknown packet 0x{:02x} from {}",
                    packet_id as u8, peer
                ),
                LogSeverity::Warning,
            ),
        }
    }
    Ok(())
}

async fn write_loop<S: AsyncWrite>(
    mut frames: FramedWrite<WriteHalf<S>, ServerCodec>,
    mut commands: mpsc::Receiver<ServerPacket>,
    peer: SocketAddr,
) -> Result<()> {
    while let Some(packet) = commands.recv().await {
        log(
            format!("Sending {} to {}", packet.name(), peer),
            LogSeverity::Debug,
        );
        frames.send(packet).await?;
    }
    Ok(())
}

async fn supervise(
    mut reader: JoinHandle<Result<()>>,
    mut writer: JoinHandle<Result<()>>,
    peer: SocketAddr,
    closed: watch::Sender<bool>,
) {
    let finished = tokio::select! {
        outcome = &mut reader => Finished::Reader(outcome),
        outcome = &mut writer => Finished::Writer(outcome),
    };

    let (half, outcome) = match finished {
        Finished::Reader(outcome) => {
            writer.abort();
            let _ = writer.await;
            ("read", outcome)
        }
        Finished::Writer(outcome) => {
            reader.abort();
            let _ = reader.await;
            ("write", outcome)
        }
    };

    match outcome {
        Ok(Ok(())) => log(format!("Connection {} closed", peer), LogSeverity::Debug),
        Ok(Err(err)) => log(
            format!("Connection {} failed on {}: {}", peer, half, err),
            LogSeverity::Error,
        ),
        Err(err) => log(
            format!("Connection {} {} task died: {}", peer, half, err),
            LogSeverity::Error,
        ),
    }

    let _ = closed.send(true);
}
