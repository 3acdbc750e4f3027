use crate::config::ServerConfig;
use crate::error::{CobbleError, ErrorKind, Result, ResultExt};
use crate::logger::{log, LogSeverity};
use crate::protocol::chunk::PreChunkPacket;
use crate::protocol::handshake::{HandshakeRequestPacket, HandshakeResponsePacket};
use crate::protocol::kick::KickPacket;
use crate::protocol::login::{LoginRequestPacket, LoginResponsePacket};
use crate::protocol::player_position_and_look::PlayerMoveLookPacket;
use crate::protocol::spawn_position::SpawnPositionPacket;
use crate::protocol::{ClientPacket, ServerPacket};
use crate::session::Connection;
use crate::session_manager::SessionRegistry;
use crate::types::{BlockPosition, PlayerLook, PlayerPosition};
use crate::world::{ChunkPos, World, WorldHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use LogSeverity::*;

/// Eye height above the feet, reported as the stance
const PLAYER_EYE_HEIGHT: f64 = 1.62;

/// The listening server: an open world, the session registry and a bound socket.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
}

/// Everything a connection task needs. Cheap to clone, one copy per connection.
#[derive(Clone)]
struct Dispatcher {
    config: Arc<ServerConfig>,
    registry: SessionRegistry,
    world: WorldHandle,
}

impl Server {
    /// Opens the world, starts the registry and world tasks and binds the listener. A world
    /// that cannot be opened is fatal.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let world = World::open(&config.world_path)
            .context(format!("could not open world {}", config.world_path.display()))?;
        let world = WorldHandle::spawn(world);
        let registry = SessionRegistry::spawn(config.max_clients)?;

        let listener = TcpListener::bind(&config.bind_address)
            .await
            .context(format!("could not listen on {}", config.bind_address))?;
        log(
            format!("Listening on {}", listener.local_addr()?),
            Info,
        );

        Ok(Server {
            listener,
            dispatcher: Dispatcher {
                config: Arc::new(config),
                registry,
                world,
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> SessionRegistry {
        self.dispatcher.registry.clone()
    }

    pub fn world(&self) -> WorldHandle {
        self.dispatcher.world.clone()
    }

    /// Accepts connections forever. Each one is handled in a separate task.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    log(format!("Failed to accept connection: {}", err), Error);
                    sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            if let Err(err) = stream.set_nodelay(true) {
                log(format!("Could not set TCP_NODELAY for {}: {}", peer, err), Debug);
            }
            log(format!("New connection from: {}", peer), Info);

            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher.handle(Connection::spawn(stream, peer)).await;
            });
        }
    }
}

impl Dispatcher {
    async fn handle(&self, mut connection: Connection) {
        match self.talk(&mut connection).await {
            Ok(()) => log(format!("{} disconnected", connection.describe()), Info),
            Err(err) if err.kind() == ErrorKind::WorldIntegrity => log(
                format!("Dropping {}: {}", connection.describe(), err),
                Error,
            ),
            Err(err) => log(
                format!("Dropping {}: {}", connection.describe(), err),
                Warning,
            ),
        }

        // the player goes before the id, so the next holder of the id starts clean
        if connection.id >= 0 {
            if let Err(err) = self.world.remove_player(connection.id).await {
                log(format!("Could not remove player {}: {}", connection.id, err), Error);
            }
            if let Err(err) = self.registry.release(connection.id).await {
                log(format!("Could not release session {}: {}", connection.id, err), Error);
            }
        }
    }

    /// Handshake, login, spawn, then play until the connection goes away. Returns `Ok` when
    /// the client simply left.
    async fn talk(&self, connection: &mut Connection) -> Result<()> {
        let handshake = self
            .await_stage(connection, "handshake", |packet| match packet {
                ClientPacket::Handshake(handshake) => Ok(handshake),
                other => Err(other),
            })
            .await?;
        let Some(HandshakeRequestPacket { username }) = handshake else {
            return Ok(());
        };
        log(
            format!("Received handshake from {} ({})", username, connection.peer),
            Debug,
        );
        connection
            .send(ServerPacket::Handshake(HandshakeResponsePacket {
                server_id: self.config.server_id.clone(),
            }))
            .await?;

        let login = self
            .await_stage(connection, "login", |packet| match packet {
                ClientPacket::Login(login) => Ok(login),
                other => Err(other),
            })
            .await?;
        let Some(LoginRequestPacket {
            protocol_version,
            username,
            ..
        }) = login
        else {
            return Ok(());
        };
        log(
            format!(
                "Player {} attempting to login (protocol {})",
                username, protocol_version
            ),
            Debug,
        );
        connection.username = username;

        // waits for a free id; gives up if the client leaves meanwhile
        let registered = self
            .registry
            .register_unless(
                connection.username.clone(),
                connection.peer,
                connection.closed(),
            )
            .await?;
        let Some(id) = registered else {
            return Ok(());
        };
        connection.id = id;
        connection
            .send(ServerPacket::Login(LoginResponsePacket {
                player_id: id,
                server_name: self.config.server_name.clone(),
                motd: self.config.motd.clone(),
            }))
            .await?;

        let spawn = self.world.spawn_position().await?;
        connection
            .send(ServerPacket::SpawnPosition(SpawnPositionPacket { position: spawn }))
            .await?;

        let position = spawn_point(spawn);
        let look = PlayerLook::default();
        self.world.set_player_position(id, position).await?;
        self.world.set_player_look(id, look).await?;

        if self.config.view_distance > 0 {
            self.stream_chunks(connection, spawn).await?;
            connection
                .send(ServerPacket::PlayerMoveLook(PlayerMoveLookPacket {
                    // clientbound order is x, stance, y, z
                    position: PlayerPosition {
                        y: position.stance,
                        stance: position.y,
                        ..position
                    },
                    look,
                    on_ground: false,
                }))
                .await?;
        }

        self.play(connection).await
    }

    async fn play(&self, connection: &mut Connection) -> Result<()> {
        let id = connection.id;
        while let Some(packet) = connection.next_packet().await {
            match packet {
                ClientPacket::KeepAlive(_) | ClientPacket::Flying(_) => {}
                ClientPacket::PlayerPosition(packet) => {
                    self.world.set_player_position(id, packet.position).await?;
                }
                ClientPacket::PlayerLook(packet) => {
                    self.world.set_player_look(id, packet.look).await?;
                }
                ClientPacket::PlayerMoveLook(packet) => {
                    self.world.set_player_position(id, packet.position).await?;
                    self.world.set_player_look(id, packet.look).await?;
                }
                other => log(
                    format!("Ignoring {} from {} while playing", other.name(), connection.describe()),
                    Debug,
                ),
            }
        }
        Ok(())
    }

    /// Sends every chunk within the view distance of the spawn chunk. Chunks that cannot be
    /// read are skipped; a lost world lock ends the connection.
    async fn stream_chunks(&self, connection: &Connection, spawn: BlockPosition) -> Result<()> {
        let center = ChunkPos::containing(spawn.x, spawn.z);
        let radius = self.config.view_distance;
        let mut sent = 0;

        for x in center.x.saturating_sub(radius)..=center.x.saturating_add(radius) {
            for z in center.z.saturating_sub(radius)..=center.z.saturating_add(radius) {
                let chunk = match self.world.load_chunk(x, z).await {
                    Ok(chunk) => chunk,
                    Err(err) if err.kind() == ErrorKind::WorldIntegrity => return Err(err),
                    Err(err) => {
                        log(format!("Skipping chunk ({}, {}): {}", x, z, err), Warning);
                        continue;
                    }
                };
                connection
                    .send(ServerPacket::PreChunk(PreChunkPacket { x, z, mode: true }))
                    .await?;
                connection
                    .send(ServerPacket::MapChunk(chunk.map_chunk_packet()))
                    .await?;
                sent += 1;
            }
        }

        log(
            format!("Sent {} chunks to {}", sent, connection.describe()),
            Debug,
        );
        Ok(())
    }

    /// Waits for the packet that ends a pre-play stage. Other packets are ignored. `None`
    /// means the connection closed first. With a handshake timeout configured, running out
    /// of time kicks the client.
    async fn await_stage<T>(
        &self,
        connection: &mut Connection,
        stage: &str,
        pick: impl Fn(ClientPacket) -> std::result::Result<T, ClientPacket>,
    ) -> Result<Option<T>> {
        let peer = connection.peer;
        let wait = async {
            while let Some(packet) = connection.next_packet().await {
                match pick(packet) {
                    Ok(found) => return Some(found),
                    Err(other) => log(
                        format!("Ignoring {} from {} before {}", other.name(), peer, stage),
                        Debug,
                    ),
                }
            }
            None
        };

        let Some(limit) = self.config.handshake_timeout() else {
            return Ok(wait.await);
        };
        let outcome = timeout(limit, wait).await;
        match outcome {
            Ok(found) => Ok(found),
            Err(_) => {
                connection
                    .send(ServerPacket::Kick(KickPacket {
                        reason: "Took too long to log in".to_owned(),
                    }))
                    .await?;
                Err(CobbleError::ProtocolError(format!(
                    "no {} within {} seconds",
                    stage,
                    limit.as_secs()
                )))
            }
        }
    }
}

/// Feet position for a player placed on the spawn block.
fn spawn_point(spawn: BlockPosition) -> PlayerPosition {
    let y = spawn.y as f64;
    PlayerPosition {
        x: spawn.x as f64 + 0.5,
        y,
        stance: y + PLAYER_EYE_HEIGHT,
        z: spawn.z as f64 + 0.5,
    }
}
