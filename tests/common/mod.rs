#![allow(dead_code)]

use cobble::config::ServerConfig;
use cobble::nbt::{Compound, List, NbtFile, Tag};
use cobble::protocol::handshake::HandshakeRequestPacket;
use cobble::protocol::login::LoginRequestPacket;
use cobble::protocol::{ClientCodec, ClientPacket, Frame, ServerPacket};
use cobble::server::Server;
use cobble::session_manager::SessionRegistry;
use cobble::types::BlockPosition;
use cobble::world::{chunk_path, Chunk, ChunkPos, LevelData, WorldHandle};
use futures::{SinkExt, StreamExt};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::codec::Framed;

pub const SPAWN: BlockPosition = BlockPosition {
    x: 12,
    y: 70,
    z: -40,
};
pub const PROTOCOL_VERSION: i32 = 2;

static NEXT_WORLD: AtomicUsize = AtomicUsize::new(0);

/// World directory under the system temp dir, removed on drop.
pub struct TestWorld {
    pub dir: PathBuf,
}

impl TestWorld {
    /// `level.dat` with spawn at [`SPAWN`] and a zeroed `session.lock`.
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "cobble-{}-{}-{}",
            name,
            std::process::id(),
            NEXT_WORLD.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let world = TestWorld { dir };
        world.write_level(&level_data().to_compound());
        fs::write(world.lock_path(), [0u8; 8]).unwrap();
        world
    }

    pub fn level_path(&self) -> PathBuf {
        self.dir.join("level.dat")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join("session.lock")
    }

    pub fn chunk_file(&self, x: i32, z: i32) -> PathBuf {
        self.dir.join(chunk_path(x, z))
    }

    pub fn write_level(&self, data: &Compound) {
        let mut root = Compound::new();
        root.insert("Data", Tag::Compound(data.clone()));
        NbtFile::new("", root).save(self.level_path()).unwrap();
    }

    /// Writes a chunk file for (x, z) and returns what was written.
    pub fn write_chunk(&self, x: i32, z: i32) -> Chunk {
        let chunk = test_chunk(x, z);
        let path = self.chunk_file(x, z);
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut root = Compound::new();
        root.insert("Level", Tag::Compound(chunk.to_compound()));
        NbtFile::new("", root).save(&path).unwrap();
        chunk
    }

    /// Stamps the lock file the way a second process opening the world would.
    pub fn steal_lock(&self, timestamp: i64) {
        fs::write(self.lock_path(), timestamp.to_be_bytes()).unwrap();
    }

    pub fn read_lock(&self) -> i64 {
        let bytes = fs::read(self.lock_path()).unwrap();
        i64::from_be_bytes(bytes[..8].try_into().unwrap())
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

pub fn level_data() -> LevelData {
    LevelData {
        snow_covered: false,
        time: 6000,
        spawn: SPAWN,
        last_played: 1_290_000_000_000,
        size_on_disk: 81920,
        random_seed: 3_141_592_653,
    }
}

/// A chunk whose contents depend on its coordinates, so two chunks never compare equal.
pub fn test_chunk(x: i32, z: i32) -> Chunk {
    let mut chunk = Chunk::empty(ChunkPos::new(x, z));
    for (index, block) in chunk.blocks.iter_mut().enumerate().take(128) {
        *block = (index as i32 + x * 7 + z * 13).rem_euclid(50) as u8;
    }
    chunk.height_map = vec![64; 256];
    chunk.last_update = 1200;

    let mut sign = Compound::new();
    sign.insert("id", Tag::String("Sign".to_owned()));
    sign.insert("x", Tag::Int(x * 16));
    sign.insert("y", Tag::Int(64));
    sign.insert("z", Tag::Int(z * 16));
    sign.insert("Text1", Tag::String(format!("chunk {} {}", x, z)));
    chunk.tile_entities = List::from_items(vec![Tag::Compound(sign)]).unwrap();
    chunk
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: SessionRegistry,
    pub world: WorldHandle,
}

pub async fn start_server(world: &TestWorld, configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut config = ServerConfig {
        bind_address: "127.0.0.1:0".to_owned(),
        world_path: world.dir.clone(),
        server_name: "test server".to_owned(),
        motd: "hello".to_owned(),
        ..ServerConfig::default()
    };
    configure(&mut config);

    let server = Server::bind(config).await.unwrap();
    let started = TestServer {
        addr: server.local_addr().unwrap(),
        registry: server.registry(),
        world: server.world(),
    };
    tokio::spawn(server.serve());
    started
}

pub type Client = Framed<TcpStream, ClientCodec>;

pub async fn connect_to_server(addr: SocketAddr) -> Client {
    Framed::new(TcpStream::connect(addr).await.unwrap(), ClientCodec)
}

pub async fn send_packet(client: &mut Client, packet: ClientPacket) {
    client.send(packet).await.unwrap();
}

pub async fn send_handshake(client: &mut Client, username: &str) {
    send_packet(
        client,
        ClientPacket::Handshake(HandshakeRequestPacket {
            username: username.to_owned(),
        }),
    )
    .await;
}

pub async fn send_login(client: &mut Client, username: &str) {
    send_packet(
        client,
        ClientPacket::Login(LoginRequestPacket {
            protocol_version: PROTOCOL_VERSION,
            username: username.to_owned(),
            password: String::new(),
        }),
    )
    .await;
}

/// Next packet from the server, or `None` if nothing arrives within `wait` or the
/// connection closed.
pub async fn try_read_packet(client: &mut Client, wait: Duration) -> Option<ServerPacket> {
    match timeout(wait, client.next()).await {
        Ok(Some(Ok(Frame::Known(packet)))) => Some(packet),
        Ok(Some(Ok(Frame::Unknown(id)))) => panic!("server sent unknown packet {}", id),
        Ok(Some(Err(err))) => panic!("could not decode server packet: {}", err),
        Ok(None) | Err(_) => None,
    }
}

pub async fn read_packet(client: &mut Client) -> ServerPacket {
    try_read_packet(client, Duration::from_secs(5))
        .await
        .expect("server sent nothing")
}

/// True once the server has closed the stream.
pub async fn wait_for_close(client: &mut Client) -> bool {
    matches!(timeout(Duration::from_secs(5), client.next()).await, Ok(None))
}

/// Runs handshake and login, checks the replies and the spawn position, and returns the
/// assigned session id.
pub async fn login(client: &mut Client, username: &str) -> i32 {
    send_handshake(client, username).await;
    match read_packet(client).await {
        ServerPacket::Handshake(reply) => assert_eq!(reply.server_id, "bcfd241a420f886e"),
        other => panic!("expected handshake reply, got {:?}", other),
    }

    send_login(client, username).await;
    let id = match read_packet(client).await {
        ServerPacket::Login(reply) => {
            assert_eq!(reply.server_name, "test server");
            assert_eq!(reply.motd, "hello");
            reply.player_id
        }
        other => panic!("expected login reply, got {:?}", other),
    };

    match read_packet(client).await {
        ServerPacket::SpawnPosition(packet) => assert_eq!(packet.position, SPAWN),
        other => panic!("expected spawn position, got {:?}", other),
    }
    id
}

/// Polls `check` until it holds, failing the test after a few seconds.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..250 {
        if check().await {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {}", what);
}
