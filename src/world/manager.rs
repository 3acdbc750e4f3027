use crate::error::{CobbleError, Result};
use crate::logger::{log, LogSeverity};
use crate::types::{BlockPosition, PlayerLook, PlayerPosition};
use crate::world::{Chunk, ChunkPos, World};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const REQUEST_QUEUE: usize = 256;

/// Last known position and look of a player, keyed by session id in the world task.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerState {
    pub position: PlayerPosition,
    pub look: PlayerLook,
}

#[derive(Debug)]
enum WorldRequest {
    SpawnPosition {
        reply: oneshot::Sender<BlockPosition>,
    },
    SetPlayerPosition {
        id: i32,
        position: PlayerPosition,
    },
    SetPlayerLook {
        id: i32,
        look: PlayerLook,
    },
    RemovePlayer {
        id: i32,
    },
    Player {
        id: i32,
        reply: oneshot::Sender<Option<PlayerState>>,
    },
    LoadChunk {
        pos: ChunkPos,
        reply: oneshot::Sender<Result<Arc<Chunk>>>,
    },
}

/// Cloneable handle to the task that owns a [`World`]. Requests are served one at a time, so
/// a chunk requested by several connections at once is decoded only once. The world closes
/// when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    sender: mpsc::Sender<WorldRequest>,
}

impl WorldHandle {
    /// Moves `world` onto a blocking thread, since chunk reads are synchronous file I/O.
    pub fn spawn(world: World) -> Self {
        let (sender, receiver) = mpsc::channel(REQUEST_QUEUE);
        tokio::task::spawn_blocking(move || serve(world, receiver));
        WorldHandle { sender }
    }

    pub async fn spawn_position(&self) -> Result<BlockPosition> {
        let (reply, response) = oneshot::channel();
        self.request(WorldRequest::SpawnPosition { reply }).await?;
        response.await.map_err(|_| CobbleError::ChannelClosed("world"))
    }

    pub async fn set_player_position(&self, id: i32, position: PlayerPosition) -> Result<()> {
        self.request(WorldRequest::SetPlayerPosition { id, position })
            .await
    }

    pub async fn set_player_look(&self, id: i32, look: PlayerLook) -> Result<()> {
        self.request(WorldRequest::SetPlayerLook { id, look }).await
    }

    pub async fn remove_player(&self, id: i32) -> Result<()> {
        self.request(WorldRequest::RemovePlayer { id }).await
    }

    pub async fn player(&self, id: i32) -> Result<Option<PlayerState>> {
        let (reply, response) = oneshot::channel();
        self.request(WorldRequest::Player { id, reply }).await?;
        response.await.map_err(|_| CobbleError::ChannelClosed("world"))
    }

    pub async fn load_chunk(&self, x: i32, z: i32) -> Result<Arc<Chunk>> {
        let (reply, response) = oneshot::channel();
        let pos = ChunkPos::new(x, z);
        self.request(WorldRequest::LoadChunk { pos, reply }).await?;
        response
            .await
            .map_err(|_| CobbleError::ChannelClosed("world"))?
    }

    async fn request(&self, request: WorldRequest) -> Result<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| CobbleError::ChannelClosed("world"))
    }
}

fn serve(mut world: World, mut receiver: mpsc::Receiver<WorldRequest>) {
    let mut players: HashMap<i32, PlayerState> = HashMap::new();

    while let Some(request) = receiver.blocking_recv() {
        match request {
            WorldRequest::SpawnPosition { reply } => {
                let _ = reply.send(world.level().spawn);
            }
            WorldRequest::SetPlayerPosition { id, position } => {
                players.entry(id).or_default().position = position;
            }
            WorldRequest::SetPlayerLook { id, look } => {
                players.entry(id).or_default().look = look;
            }
            WorldRequest::RemovePlayer { id } => {
                players.remove(&id);
            }
            WorldRequest::Player { id, reply } => {
                let _ = reply.send(players.get(&id).copied());
            }
            WorldRequest::LoadChunk { pos, reply } => {
                let result = world.load_chunk(pos.x, pos.z);
                if let Err(err) = &result {
                    log(
                        format!("Chunk ({}, {}) unavailable: {}", pos.x, pos.z, err),
                        LogSeverity::Debug,
                    );
                }
                let _ = reply.send(result);
            }
        }
    }

    world.close();
}
