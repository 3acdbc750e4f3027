use crate::error::{Result, ResultExt};
use crate::nbt::{Compound, NbtFile};
use crate::types::BlockPosition;
use std::path::Path;

/// Global world metadata, projected from the "Data" compound of `level.dat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelData {
    pub snow_covered: bool,
    pub time: i64,
    pub spawn: BlockPosition,
    pub last_played: i64,
    pub size_on_disk: i64,
    pub random_seed: i64,
}

impl LevelData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = NbtFile::load(path)?;
        let data = file
            .root
            .get_compound("Data")
            .context("level.dat has no Data compound")?;
        Self::from_compound(data).context("malformed level.dat")
    }

    /// Every field must be present with exactly the stored width.
    pub fn from_compound(data: &Compound) -> Result<Self> {
        Ok(LevelData {
            snow_covered: data.get_byte("SnowCovered")? != 0,
            time: data.get_long("Time")?,
            spawn: BlockPosition {
                x: data.get_int("SpawnX")?,
                y: data.get_int("SpawnY")?,
                z: data.get_int("SpawnZ")?,
            },
            last_played: data.get_long("LastPlayed")?,
            size_on_disk: data.get_long("SizeOnDisk")?,
            random_seed: data.get_long("RandomSeed")?,
        })
    }

    pub fn to_compound(&self) -> Compound {
        use crate::nbt::Tag;

        let mut data = Compound::new();
        data.insert("SnowCovered", Tag::Byte(self.snow_covered as i8));
        data.insert("Time", Tag::Long(self.time));
        data.insert("SpawnX", Tag::Int(self.spawn.x));
        data.insert("SpawnY", Tag::Int(self.spawn.y));
        data.insert("SpawnZ", Tag::Int(self.spawn.z));
        data.insert("LastPlayed", Tag::Long(self.last_played));
        data.insert("SizeOnDisk", Tag::Long(self.size_on_disk));
        data.insert("RandomSeed", Tag::Long(self.random_seed));
        data
    }
}
