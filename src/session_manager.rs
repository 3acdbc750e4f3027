use crate::error::{CobbleError, Result};
use crate::logger::{log, LogSeverity};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};

const COMMAND_QUEUE: usize = 64;

/// A registered client, as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEntry {
    pub id: i32,
    pub username: String,
    pub peer: SocketAddr,
}

#[derive(Debug)]
enum RegistryCommand {
    Register {
        username: String,
        peer: SocketAddr,
        reply: oneshot::Sender<i32>,
    },
    Release {
        id: i32,
    },
    Online {
        reply: oneshot::Sender<Vec<ClientEntry>>,
    },
    Waiting {
        reply: oneshot::Sender<usize>,
    },
}

#[derive(Debug)]
struct Waiter {
    username: String,
    peer: SocketAddr,
    reply: oneshot::Sender<i32>,
}

/// Handle to the task that hands out session ids. The task owns a fixed pool of ids and the
/// table of registered clients; every change goes through it, one command at a time.
///
/// When the pool is empty, `register` waits until an id is released. Waiters are served in
/// arrival order, and a waiter whose caller has given up is skipped.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sender: mpsc::Sender<RegistryCommand>,
}

impl SessionRegistry {
    /// Starts the registry with ids `0..capacity`. The capacity must fit the id type.
    pub fn spawn(capacity: usize) -> Result<Self> {
        let top = i32::try_from(capacity).map_err(|_| {
            CobbleError::ConfigError(format!(
                "session capacity {} exceeds the largest id {}",
                capacity,
                i32::MAX
            ))
        })?;
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE);
        let coordinator = Coordinator {
            pool: (0..top).collect(),
            clients: HashMap::new(),
            waiters: VecDeque::new(),
        };
        tokio::spawn(coordinator.run(receiver));
        Ok(SessionRegistry { sender })
    }

    /// Waits for a free id. Dropping this future after the coordinator has answered loses
    /// the id; callers that may give up should use [`SessionRegistry::register_unless`].
    pub async fn register(&self, username: impl Into<String>, peer: SocketAddr) -> Result<i32> {
        let response = self.request(username.into(), peer).await?;
        response
            .await
            .map_err(|_| CobbleError::ChannelClosed("session registry"))
    }

    /// Like `register`, but gives up once `cancelled` completes and returns `None`. An id
    /// that was assigned while giving up is released again, so it never leaks.
    pub async fn register_unless<F>(
        &self,
        username: impl Into<String>,
        peer: SocketAddr,
        cancelled: F,
    ) -> Result<Option<i32>>
    where
        F: Future<Output = ()>,
    {
        let mut response = self.request(username.into(), peer).await?;
        tokio::select! {
            id = &mut response => id
                .map(Some)
                .map_err(|_| CobbleError::ChannelClosed("session registry")),
            () = cancelled => {
                // any send after close fails, so try_recv sees every id that got through
                response.close();
                if let Ok(id) = response.try_recv() {
                    self.release(id).await?;
                }
                Ok(None)
            }
        }
    }

    /// Returns `id` to the pool. Releasing an id that is not registered is ignored.
    pub async fn release(&self, id: i32) -> Result<()> {
        self.command(RegistryCommand::Release { id }).await
    }

    /// Registered clients, ordered by id.
    pub async fn online(&self) -> Result<Vec<ClientEntry>> {
        let (reply, response) = oneshot::channel();
        self.command(RegistryCommand::Online { reply }).await?;
        response
            .await
            .map_err(|_| CobbleError::ChannelClosed("session registry"))
    }

    /// Number of queued waiters, including ones that gave up since the last queue change.
    pub async fn waiting(&self) -> Result<usize> {
        let (reply, response) = oneshot::channel();
        self.command(RegistryCommand::Waiting { reply }).await?;
        response
            .await
            .map_err(|_| CobbleError::ChannelClosed("session registry"))
    }

    async fn request(&self, username: String, peer: SocketAddr) -> Result<oneshot::Receiver<i32>> {
        let (reply, response) = oneshot::channel();
        self.command(RegistryCommand::Register {
            username,
            peer,
            reply,
        })
        .await?;
        Ok(response)
    }

    async fn command(&self, command: RegistryCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| CobbleError::ChannelClosed("session registry"))
    }
}

struct Coordinator {
    pool: VecDeque<i32>,
    clients: HashMap<i32, ClientEntry>,
    waiters: VecDeque<Waiter>,
}

impl Coordinator {
    async fn run(mut self, mut receiver: mpsc::Receiver<RegistryCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                RegistryCommand::Register {
                    username,
                    peer,
                    reply,
                } => {
                    let waiter = Waiter {
                        username,
                        peer,
                        reply,
                    };
                    match self.pool.pop_front() {
                        Some(id) => {
                            if !self.assign(id, waiter) {
                                self.pool.push_front(id);
                            }
                        }
                        None => {
                            self.waiters.retain(|waiter| !waiter.reply.is_closed());
                            log(
                                format!(
                                    "No free session id, {} waits ({} already waiting)",
                                    waiter.username,
                                    self.waiters.len()
                                ),
                                LogSeverity::Warning,
                            );
                            self.waiters.push_back(waiter);
                        }
                    }
                }
                RegistryCommand::Release { id } => self.release(id),
                RegistryCommand::Online { reply } => {
                    let mut online: Vec<ClientEntry> = self.clients.values().cloned().collect();
                    online.sort_by_key(|entry| entry.id);
                    let _ = reply.send(online);
                }
                RegistryCommand::Waiting { reply } => {
                    let _ = reply.send(self.waiters.len());
                }
            }
        }
    }

    /// Registers the waiter under `id`. False when the caller is no longer listening, in
    /// which case `id` is still free.
    fn assign(&mut self, id: i32, waiter: Waiter) -> bool {
        if waiter.reply.send(id).is_err() {
            return false;
        }
        log(
            format!(
                "Registered {} ({}) as session {}",
                waiter.username, waiter.peer, id
            ),
            LogSeverity::Info,
        );
        self.clients.insert(
            id,
            ClientEntry {
                id,
                username: waiter.username,
                peer: waiter.peer,
            },
        );
        true
    }

    fn release(&mut self, id: i32) {
        let Some(entry) = self.clients.remove(&id) else {
            log(
                format!("Ignoring release of unassigned session {}", id),
                LogSeverity::Warning,
            );
            return;
        };
        log(
            format!("Released session {} ({})", id, entry.username),
            LogSeverity::Info,
        );

        while let Some(waiter) = self.waiters.pop_front() {
            if self.assign(id, waiter) {
                return;
            }
        }
        self.pool.push_back(id);
    }
}
