//! Named binary tags: the self-describing format of `level.dat` and chunk files. The
//! fixed-width primitives underneath are shared with the wire protocol.

pub mod file;
pub mod primitive;
pub mod tag;

pub use file::NbtFile;
pub use tag::{read_compound, read_root_compound, Compound, List, NamedTag, Tag, TagType};
