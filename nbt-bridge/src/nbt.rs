//! Portable NBT tag tree, owned by this crate and independent of any host runtime.

use std::collections::BTreeMap;
use std::fmt;


/// Kind of a NBT tag, the numeric identifiers are the ones used by the Notchian format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NbtKind {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
}

impl NbtKind {

    /// Return the numeric identifier of this kind.
    pub fn id(self) -> i8 {
        match self {
            Self::End => 0,
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 3,
            Self::Long => 4,
            Self::Float => 5,
            Self::Double => 6,
            Self::ByteArray => 7,
            Self::String => 8,
            Self::List => 9,
            Self::Compound => 10,
            Self::IntArray => 11,
        }
    }

    /// Return the kind associated to the given numeric identifier, if any.
    pub fn from_id(id: i8) -> Option<Self> {
        Some(match id {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            _ => return None,
        })
    }

}


/// A named NBT tag. The name is only meaningful to the enclosing compound.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtTag {
    name: String,
    value: Nbt,
}

/// The payload of a NBT tag.
#[derive(Clone, PartialEq)]
pub enum Nbt {
    /// Terminator marker, it has no payload.
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
}

/// An ordered sequence of tags sharing one declared element kind.
///
/// The declared kind is the kind of the last tag pushed, or [`NbtKind::Byte`] while
/// the list is empty. It is not re-validated when the tags are modified afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtList {
    kind: NbtKind,
    inner: Vec<NbtTag>,
}

/// An abstract NBT compound type that hides the internal implementation of the mapping.
/// Every tag is stored under its own name.
#[derive(Clone, PartialEq, Default)]
pub struct NbtCompound {
    inner: BTreeMap<String, NbtTag>,
}


impl NbtTag {

    /// Create a new tag with the given name and value. End tags carry no name, so the
    /// name is discarded for them.
    pub fn new(name: impl Into<String>, value: Nbt) -> Self {
        match value {
            Nbt::End => Self::end(),
            value => Self { name: name.into(), value },
        }
    }

    /// Create an end tag.
    #[inline]
    pub fn end() -> Self {
        Self { name: String::new(), value: Nbt::End }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &Nbt {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut Nbt {
        &mut self.value
    }

    #[inline]
    pub fn into_value(self) -> Nbt {
        self.value
    }

    #[inline]
    pub fn kind(&self) -> NbtKind {
        self.value.kind()
    }

}


/// Basic methods to interpret a tag as its inner type if possible.
impl Nbt {

    pub fn kind(&self) -> NbtKind {
        match self {
            Self::End => NbtKind::End,
            Self::Byte(_) => NbtKind::Byte,
            Self::Short(_) => NbtKind::Short,
            Self::Int(_) => NbtKind::Int,
            Self::Long(_) => NbtKind::Long,
            Self::Float(_) => NbtKind::Float,
            Self::Double(_) => NbtKind::Double,
            Self::ByteArray(_) => NbtKind::ByteArray,
            Self::IntArray(_) => NbtKind::IntArray,
            Self::String(_) => NbtKind::String,
            Self::List(_) => NbtKind::List,
            Self::Compound(_) => NbtKind::Compound,
        }
    }

    #[inline]
    pub fn as_byte(&self) -> Option<i8> {
        match *self {
            Self::Byte(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_short(&self) -> Option<i16> {
        match *self {
            Self::Short(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_long(&self) -> Option<i64> {
        match *self {
            Self::Long(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            Self::Float(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Self::Double(n) => Some(n),
            _ => None
        }
    }

    #[inline]
    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            Self::ByteArray(buf) => Some(&buf[..]),
            _ => None
        }
    }

    #[inline]
    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Self::IntArray(buf) => Some(&buf[..]),
            _ => None
        }
    }

    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(string) => Some(string.as_str()),
            _ => None
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&NbtList> {
        match self {
            Self::List(list) => Some(list),
            _ => None
        }
    }

    #[inline]
    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            Self::Compound(comp) => Some(comp),
            _ => None
        }
    }

    #[inline]
    pub fn as_compound_mut(&mut self) -> Option<&mut NbtCompound> {
        match self {
            Self::Compound(comp) => Some(comp),
            _ => None
        }
    }

}


impl NbtList {

    /// Create a new empty list, its declared kind is byte until a tag is pushed.
    pub fn new() -> Self {
        Self { kind: NbtKind::Byte, inner: Vec::new() }
    }

    /// Create a list from the given tags, the declared kind is the kind of the last tag.
    pub fn from_tags(tags: Vec<NbtTag>) -> Self {
        let kind = tags.last().map(NbtTag::kind).unwrap_or(NbtKind::Byte);
        Self { kind, inner: tags }
    }

    /// Create a list from the given tags, checking that they all share the same kind.
    pub fn from_tags_checked(tags: Vec<NbtTag>) -> Result<Self, NbtError> {
        if let Some(first) = tags.first() {
            let expected = first.kind();
            if let Some((index, tag)) = tags.iter().enumerate().find(|(_, tag)| tag.kind() != expected) {
                return Err(NbtError::ListKindMismatch { expected, found: tag.kind(), index });
            }
        }
        Ok(Self::from_tags(tags))
    }

    /// Push a tag at the end of this list, the declared kind becomes the tag's kind.
    pub fn push(&mut self, tag: NbtTag) {
        self.kind = tag.kind();
        self.inner.push(tag);
    }

    #[inline]
    pub fn kind(&self) -> NbtKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&NbtTag> {
        self.inner.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, NbtTag> {
        self.inner.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[NbtTag] {
        &self.inner
    }

}

impl Default for NbtList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = std::slice::Iter<'a, NbtTag>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}


/// Basic methods to create and manage keys in a compound.
impl NbtCompound {

    pub fn new() -> Self {
        Self { inner: BTreeMap::new() }
    }

    /// Insert a tag under its own name, returning any tag previously stored there.
    #[inline]
    pub fn insert(&mut self, tag: NbtTag) -> Option<NbtTag> {
        self.inner.insert(tag.name.clone(), tag)
    }

    /// Insert a value under the given name, returning any tag previously stored there.
    #[inline]
    pub fn insert_value(&mut self, name: impl Into<String>, value: Nbt) -> Option<NbtTag> {
        self.insert(NbtTag::new(name, value))
    }

    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<NbtTag> {
        self.inner.remove(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over all tags in this compound, the order is not significant.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &NbtTag> + '_ {
        self.inner.values()
    }

    #[inline]
    pub fn get_tag(&self, key: &str) -> Option<&NbtTag> {
        self.inner.get(key)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Nbt> {
        self.inner.get(key).map(NbtTag::value)
    }

    #[inline]
    pub fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(Nbt::as_byte)
    }

    #[inline]
    pub fn get_short(&self, key: &str) -> Option<i16> {
        self.get(key).and_then(Nbt::as_short)
    }

    #[inline]
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Nbt::as_int)
    }

    #[inline]
    pub fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Nbt::as_long)
    }

    #[inline]
    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Nbt::as_float)
    }

    #[inline]
    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Nbt::as_double)
    }

    #[inline]
    pub fn get_byte_array(&self, key: &str) -> Option<&[i8]> {
        self.get(key).and_then(Nbt::as_byte_array)
    }

    #[inline]
    pub fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        self.get(key).and_then(Nbt::as_int_array)
    }

    #[inline]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Nbt::as_string)
    }

    #[inline]
    pub fn get_list(&self, key: &str) -> Option<&NbtList> {
        self.get(key).and_then(Nbt::as_list)
    }

    #[inline]
    pub fn get_compound(&self, key: &str) -> Option<&NbtCompound> {
        self.get(key).and_then(Nbt::as_compound)
    }

}


/// Manual debug implement to shrink the potential huge arrays.
impl fmt::Debug for Nbt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => f.write_str("End"),
            Self::Byte(n) => f.debug_tuple("Byte").field(n).finish(),
            Self::Short(n) => f.debug_tuple("Short").field(n).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Long(n) => f.debug_tuple("Long").field(n).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Self::ByteArray(buf) => {
                f.debug_tuple("ByteArray")
                    .field(&format_args!("({}) {:X?}...", buf.len(), &buf[..buf.len().min(10)]))
                    .finish()
            }
            Self::IntArray(buf) => {
                f.debug_tuple("IntArray")
                    .field(&format_args!("({}) {:?}...", buf.len(), &buf[..buf.len().min(10)]))
                    .finish()
            }
            Self::String(string) => f.debug_tuple("String").field(string).finish(),
            Self::List(list) => f.debug_tuple("List").field(&list.kind).field(&list.inner).finish(),
            Self::Compound(compound) => f.debug_tuple("Compound").field(compound).finish(),
        }
    }
}

impl fmt::Debug for NbtCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.iter().map(|(k, v)| (k, v.value()))).finish()
    }
}


/// Error type returned when building portable tags.
#[derive(thiserror::Error, Debug)]
pub enum NbtError {
    #[error("list expected {expected:?} tags but found {found:?} at index {index}")]
    ListKindMismatch {
        expected: NbtKind,
        found: NbtKind,
        index: usize,
    },
}
