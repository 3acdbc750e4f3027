use crate::error::{CobbleError, Result};
use crate::nbt::primitive::*;
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

/// Compounds and lists nested deeper than this are rejected on decode.
pub const MAX_DEPTH: usize = 512;

/// One-byte type id that precedes every named tag and every list payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
}

impl TryFrom<i8> for TagType {
    type Error = CobbleError;

    fn try_from(id: i8) -> Result<Self> {
        Ok(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            _ => return Err(CobbleError::decode(format!("unknown tag type {}", id))),
        })
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(List),
    Compound(Compound),
}

/// Header of a tag inside a compound. The end marker carries no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTag {
    pub tag_type: TagType,
    pub name: String,
}

impl NamedTag {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let tag_type = TagType::try_from(read_i8(reader)?)?;
        if tag_type == TagType::End {
            return Ok(NamedTag {
                tag_type,
                name: String::new(),
            });
        }
        Ok(NamedTag {
            tag_type,
            name: read_string(reader)?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i8(writer, self.tag_type as i8)?;
        if self.tag_type != TagType::End {
            write_string(writer, &self.name)?;
        }
        Ok(())
    }
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::End => TagType::End,
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List(_) => TagType::List,
            Tag::Compound(_) => TagType::Compound,
        }
    }

    /// Reads a named tag header and its payload. The end marker comes back as `("", Tag::End)`.
    pub fn read<R: Read>(reader: &mut R) -> Result<(String, Tag)> {
        let header = NamedTag::read(reader)?;
        if header.tag_type == TagType::End {
            return Ok((header.name, Tag::End));
        }
        let tag = Tag::read_payload(reader, header.tag_type)?;
        Ok((header.name, tag))
    }

    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> Result<()> {
        NamedTag {
            tag_type: self.tag_type(),
            name: name.to_owned(),
        }
        .write(writer)?;
        self.write_payload(writer)
    }

    /// Reads the payload of a tag whose type is already known.
    pub fn read_payload<R: Read>(reader: &mut R, tag_type: TagType) -> Result<Tag> {
        read_payload_at(reader, tag_type, 0)
    }

    pub fn write_payload<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => write_i8(writer, *v),
            Tag::Short(v) => write_i16(writer, *v),
            Tag::Int(v) => write_i32(writer, *v),
            Tag::Long(v) => write_i64(writer, *v),
            Tag::Float(v) => write_f32(writer, *v),
            Tag::Double(v) => write_f64(writer, *v),
            Tag::ByteArray(v) => write_byte_array(writer, v),
            Tag::String(v) => write_string(writer, v),
            Tag::List(list) => {
                write_i8(writer, list.element_type as i8)?;
                write_length(writer, list.items.len(), "list")?;
                for item in &list.items {
                    item.write_payload(writer)?;
                }
                Ok(())
            }
            Tag::Compound(compound) => compound.write_payload(writer),
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[u8]> {
        match self {
            Tag::ByteArray(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }
}

fn read_payload_at<R: Read>(reader: &mut R, tag_type: TagType, depth: usize) -> Result<Tag> {
    if depth > MAX_DEPTH {
        return Err(CobbleError::decode(format!(
            "tags nested deeper than {}",
            MAX_DEPTH
        )));
    }
    Ok(match tag_type {
        TagType::End => {
            return Err(CobbleError::decode("tag type End has no payload"));
        }
        TagType::Byte => Tag::Byte(read_i8(reader)?),
        TagType::Short => Tag::Short(read_i16(reader)?),
        TagType::Int => Tag::Int(read_i32(reader)?),
        TagType::Long => Tag::Long(read_i64(reader)?),
        TagType::Float => Tag::Float(read_f32(reader)?),
        TagType::Double => Tag::Double(read_f64(reader)?),
        TagType::ByteArray => Tag::ByteArray(read_byte_array(reader)?),
        TagType::String => Tag::String(read_string(reader)?),
        TagType::List => {
            let element_type = TagType::try_from(read_i8(reader)?)?;
            let length = read_i32(reader)?;
            if length < 0 {
                return Err(CobbleError::decode(format!(
                    "list length cannot be negative, got {}",
                    length
                )));
            }
            // An empty list may declare End; a non-empty one cannot hold end markers.
            let mut items = Vec::with_capacity((length as usize).min(1024));
            for index in 0..length {
                let item = read_payload_at(reader, element_type, depth + 1).map_err(|err| {
                    CobbleError::Context {
                        message: format!("could not read list element {}", index),
                        source: Box::new(err),
                    }
                })?;
                items.push(item);
            }
            Tag::List(List {
                element_type,
                items,
            })
        }
        TagType::Compound => Tag::Compound(read_compound_at(reader, depth + 1)?),
    })
}

fn read_compound_at<R: Read>(reader: &mut R, depth: usize) -> Result<Compound> {
    let mut compound = Compound::new();
    loop {
        let header = NamedTag::read(reader)?;
        if header.tag_type == TagType::End {
            return Ok(compound);
        }
        let tag = read_payload_at(reader, header.tag_type, depth)?;
        // a repeated name replaces the earlier value
        compound.insert(header.name, tag);
    }
}

/// Reads named tags until the end marker.
pub fn read_compound<R: Read>(reader: &mut R) -> Result<Compound> {
    read_compound_at(reader, 0)
}

/// Reads a single named tag that must be a compound, returning its name and contents.
pub fn read_root_compound<R: Read>(reader: &mut R) -> Result<(String, Compound)> {
    let header = NamedTag::read(reader)?;
    if header.tag_type != TagType::Compound {
        return Err(CobbleError::decode(format!(
            "expected a root Compound tag, got {}",
            header.tag_type
        )));
    }
    Ok((header.name, read_compound(reader)?))
}

/// Homogeneous list of tags. The element type is stored once, so an empty list still knows
/// what it would hold.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element_type: TagType,
    items: Vec<Tag>,
}

impl List {
    pub fn new(element_type: TagType, items: Vec<Tag>) -> Result<Self> {
        if element_type == TagType::End && !items.is_empty() {
            return Err(CobbleError::encode("a list of End tags must be empty"));
        }
        if let Some(stray) = items.iter().find(|item| item.tag_type() != element_type) {
            return Err(CobbleError::encode(format!(
                "list of {} cannot hold a {}",
                element_type,
                stray.tag_type()
            )));
        }
        Ok(Self {
            element_type,
            items,
        })
    }

    pub fn empty(element_type: TagType) -> Self {
        Self {
            element_type,
            items: Vec::new(),
        }
    }

    /// Builds a list typed after its first element, or `End` when empty.
    pub fn from_items(items: Vec<Tag>) -> Result<Self> {
        let element_type = items.first().map_or(TagType::End, Tag::tag_type);
        Self::new(element_type, items)
    }

    pub fn element_type(&self) -> TagType {
        self.element_type
    }

    pub fn items(&self) -> &[Tag] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Tag> {
        self.items
    }
}

/// Name to tag mapping. Order is not significant and names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound(HashMap<String, Tag>);

impl Compound {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.0.insert(name.into(), tag)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Tag> {
        self.0.iter()
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (name, tag) in &self.0 {
            if tag.tag_type() == TagType::End {
                return Err(CobbleError::encode(format!(
                    "compound field {:?} cannot be an End tag",
                    name
                )));
            }
            tag.write(writer, name)?;
        }
        write_i8(writer, TagType::End as i8)
    }

    /// Writes this compound as a named root tag.
    pub fn write_root<W: Write>(&self, writer: &mut W, name: &str) -> Result<()> {
        NamedTag {
            tag_type: TagType::Compound,
            name: name.to_owned(),
        }
        .write(writer)?;
        self.write_payload(writer)
    }

    fn field(&self, name: &str, expected: TagType) -> Result<&Tag> {
        self.0
            .get(name)
            .ok_or_else(|| CobbleError::decode(format!("missing {} field {:?}", expected, name)))
    }

    pub fn get_byte(&self, name: &str) -> Result<i8> {
        match self.field(name, TagType::Byte)? {
            Tag::Byte(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Byte, other)),
        }
    }

    pub fn get_short(&self, name: &str) -> Result<i16> {
        match self.field(name, TagType::Short)? {
            Tag::Short(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Short, other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i32> {
        match self.field(name, TagType::Int)? {
            Tag::Int(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Int, other)),
        }
    }

    pub fn get_long(&self, name: &str) -> Result<i64> {
        match self.field(name, TagType::Long)? {
            Tag::Long(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Long, other)),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f32> {
        match self.field(name, TagType::Float)? {
            Tag::Float(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Float, other)),
        }
    }

    pub fn get_double(&self, name: &str) -> Result<f64> {
        match self.field(name, TagType::Double)? {
            Tag::Double(v) => Ok(*v),
            other => Err(mismatch(name, TagType::Double, other)),
        }
    }

    pub fn get_byte_array(&self, name: &str) -> Result<&[u8]> {
        match self.field(name, TagType::ByteArray)? {
            Tag::ByteArray(v) => Ok(v),
            other => Err(mismatch(name, TagType::ByteArray, other)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<&str> {
        match self.field(name, TagType::String)? {
            Tag::String(v) => Ok(v),
            other => Err(mismatch(name, TagType::String, other)),
        }
    }

    pub fn get_list(&self, name: &str) -> Result<&List> {
        match self.field(name, TagType::List)? {
            Tag::List(v) => Ok(v),
            other => Err(mismatch(name, TagType::List, other)),
        }
    }

    pub fn get_compound(&self, name: &str) -> Result<&Compound> {
        match self.field(name, TagType::Compound)? {
            Tag::Compound(v) => Ok(v),
            other => Err(mismatch(name, TagType::Compound, other)),
        }
    }
}

fn mismatch(name: &str, expected: TagType, found: &Tag) -> CobbleError {
    CobbleError::decode(format!(
        "field {:?} should be {}, found {}",
        name,
        expected,
        found.tag_type()
    ))
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Compound {
    type Item = (String, Tag);
    type IntoIter = hash_map::IntoIter<String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
