use crate::error::{Result, ResultExt};
use crate::nbt::{Compound, List, NbtFile, TagType};
use crate::protocol::chunk::MapChunkPacket;
use crate::world::base36::base36;
use std::path::{Path, PathBuf};

/// Blocks along each horizontal axis of a chunk
pub const CHUNK_WIDTH: i32 = 16;
/// Blocks along the vertical axis of a chunk
pub const CHUNK_HEIGHT: i32 = 128;

/// Chunk coordinates. Packs into a single `u64` key by bit composition, so distinct pairs
/// always give distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkPos { x, z }
    }

    pub fn key(self) -> u64 {
        ((self.x as u32 as u64) << 32) | self.z as u32 as u64
    }

    pub fn from_key(key: u64) -> Self {
        ChunkPos {
            x: (key >> 32) as u32 as i32,
            z: key as u32 as i32,
        }
    }

    /// Chunk containing the given block column.
    pub fn containing(block_x: i32, block_z: i32) -> Self {
        ChunkPos {
            x: block_x.div_euclid(CHUNK_WIDTH),
            z: block_z.div_euclid(CHUNK_WIDTH),
        }
    }
}

/// Location of a chunk file relative to the world directory:
/// `<x mod 64>/<z mod 64>/c.<x>.<z>.dat`, every number in base 36.
pub fn chunk_path(x: i32, z: i32) -> PathBuf {
    PathBuf::from(base36(x.rem_euclid(64)))
        .join(base36(z.rem_euclid(64)))
        .join(format!("c.{}.{}.dat", base36(x), base36(z)))
}

/// One chunk, projected from the "Level" compound of its file. Entities and tile entities
/// are kept as read and never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub blocks: Vec<u8>,
    pub data: Vec<u8>,
    pub sky_light: Vec<u8>,
    pub block_light: Vec<u8>,
    pub height_map: Vec<u8>,
    pub entities: List,
    pub tile_entities: List,
    pub last_update: i64,
    pub x_pos: i32,
    pub z_pos: i32,
    pub terrain_populated: bool,
}

impl Chunk {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = NbtFile::load(path)?;
        let level = file
            .root
            .get_compound("Level")
            .context("chunk file has no Level compound")?;
        Self::from_compound(level).context("malformed chunk")
    }

    pub fn from_compound(level: &Compound) -> Result<Self> {
        Ok(Chunk {
            blocks: level.get_byte_array("Blocks")?.to_vec(),
            data: level.get_byte_array("Data")?.to_vec(),
            sky_light: level.get_byte_array("SkyLight")?.to_vec(),
            block_light: level.get_byte_array("BlockLight")?.to_vec(),
            height_map: level.get_byte_array("HeightMap")?.to_vec(),
            entities: level.get_list("Entities")?.clone(),
            tile_entities: level.get_list("TileEntities")?.clone(),
            last_update: level.get_long("LastUpdate")?,
            x_pos: level.get_int("xPos")?,
            z_pos: level.get_int("zPos")?,
            terrain_populated: level.get_byte("TerrainPopulated")? != 0,
        })
    }

    pub fn to_compound(&self) -> Compound {
        use crate::nbt::Tag;

        let mut level = Compound::new();
        level.insert("Blocks", Tag::ByteArray(self.blocks.clone()));
        level.insert("Data", Tag::ByteArray(self.data.clone()));
        level.insert("SkyLight", Tag::ByteArray(self.sky_light.clone()));
        level.insert("BlockLight", Tag::ByteArray(self.block_light.clone()));
        level.insert("HeightMap", Tag::ByteArray(self.height_map.clone()));
        level.insert("Entities", Tag::List(self.entities.clone()));
        level.insert("TileEntities", Tag::List(self.tile_entities.clone()));
        level.insert("LastUpdate", Tag::Long(self.last_update));
        level.insert("xPos", Tag::Int(self.x_pos));
        level.insert("zPos", Tag::Int(self.z_pos));
        level.insert("TerrainPopulated", Tag::Byte(self.terrain_populated as i8));
        level
    }

    /// An all-air chunk at `pos` with full sky light.
    pub fn empty(pos: ChunkPos) -> Self {
        let volume = (CHUNK_WIDTH * CHUNK_WIDTH * CHUNK_HEIGHT) as usize;
        Chunk {
            blocks: vec![0; volume],
            data: vec![0; volume / 2],
            sky_light: vec![0xFF; volume / 2],
            block_light: vec![0; volume / 2],
            height_map: vec![0; (CHUNK_WIDTH * CHUNK_WIDTH) as usize],
            entities: List::empty(TagType::Compound),
            tile_entities: List::empty(TagType::Compound),
            last_update: 0,
            x_pos: pos.x,
            z_pos: pos.z,
            terrain_populated: true,
        }
    }

    pub fn pos(&self) -> ChunkPos {
        ChunkPos::new(self.x_pos, self.z_pos)
    }

    /// Block ids, metadata, block light and sky light back to back, as the map chunk packet
    /// carries them.
    pub fn map_chunk_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(
            self.blocks.len() + self.data.len() + self.block_light.len() + self.sky_light.len(),
        );
        payload.extend_from_slice(&self.blocks);
        payload.extend_from_slice(&self.data);
        payload.extend_from_slice(&self.block_light);
        payload.extend_from_slice(&self.sky_light);
        payload
    }

    /// Map chunk packet covering this whole chunk.
    pub fn map_chunk_packet(&self) -> MapChunkPacket {
        MapChunkPacket {
            x: self.x_pos.wrapping_mul(CHUNK_WIDTH),
            y: 0,
            z: self.z_pos.wrapping_mul(CHUNK_WIDTH),
            size_x: (CHUNK_WIDTH - 1) as i8,
            size_y: (CHUNK_HEIGHT - 1) as i8,
            size_z: (CHUNK_WIDTH - 1) as i8,
            data: self.map_chunk_payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::nbt::Tag;
    use std::collections::HashSet;

    #[test]
    fn test_key_is_unique_and_order_sensitive() {
        let coords = [-2, -1, 0, 1, 2, i32::MIN, i32::MAX];
        let mut keys = HashSet::new();
        for &x in &coords {
            for &z in &coords {
                let pos = ChunkPos::new(x, z);
                assert!(keys.insert(pos.key()), "duplicate key for {:?}", pos);
                assert_eq!(ChunkPos::from_key(pos.key()), pos);
                assert_eq!(pos.key(), ChunkPos::new(x, z).key());
            }
        }
        assert_ne!(ChunkPos::new(1, 2).key(), ChunkPos::new(2, 1).key());
        assert_ne!(ChunkPos::new(-1, 0).key(), ChunkPos::new(0, -1).key());
        assert_eq!(ChunkPos::new(0, -1).key(), 0x0000_0000_FFFF_FFFF);
    }

    #[test]
    fn test_containing_rounds_down() {
        assert_eq!(ChunkPos::containing(0, 15), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(16, -1), ChunkPos::new(1, -1));
        assert_eq!(ChunkPos::containing(-16, -17), ChunkPos::new(-1, -2));
    }

    #[test]
    fn test_chunk_path() {
        assert_eq!(chunk_path(0, 0), PathBuf::from("0/0/c.0.0.dat"));
        assert_eq!(chunk_path(-1, 100), PathBuf::from("1r/10/c.-1.2s.dat"));
        assert_eq!(chunk_path(64, -64), PathBuf::from("0/0/c.1s.-1s.dat"));
        assert_eq!(
            chunk_path(i32::MIN, 0),
            PathBuf::from("0/0/c.-zik0zk.0.dat")
        );
    }

    #[test]
    fn test_projection_round_trip() {
        let mut chunk = Chunk::empty(ChunkPos::new(3, -7));
        chunk.entities = List::from_items(vec![Tag::Compound(Compound::new())]).unwrap();
        chunk.blocks[0] = 1;
        assert_eq!(Chunk::from_compound(&chunk.to_compound()).unwrap(), chunk);
        assert_eq!(chunk.pos(), ChunkPos::new(3, -7));
    }

    #[test]
    fn test_projection_rejects_wrong_types() {
        let mut level = Chunk::empty(ChunkPos::new(0, 0)).to_compound();
        level.insert("xPos", Tag::Short(0));
        let err = Chunk::from_compound(&level).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_map_chunk_payload_order() {
        let mut chunk = Chunk::empty(ChunkPos::new(2, -1));
        chunk.blocks = vec![1; 4];
        chunk.data = vec![2; 2];
        chunk.block_light = vec![3; 2];
        chunk.sky_light = vec![4; 2];
        assert_eq!(chunk.map_chunk_payload(), vec![1, 1, 1, 1, 2, 2, 3, 3, 4, 4]);

        let packet = chunk.map_chunk_packet();
        assert_eq!((packet.x, packet.y, packet.z), (32, 0, -16));
        assert_eq!((packet.size_x, packet.size_y, packet.size_z), (15, 127, 15));
    }
}
