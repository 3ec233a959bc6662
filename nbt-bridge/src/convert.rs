//! Conversion between host tag trees and portable tag trees.
//!
//! Both directions are total over the tag kinds known to this crate: they either
//! return a complete, freshly allocated tree or fail without any partial output. The
//! absence of a tree is a valid input and gives an absent output.

pub mod access;

use tracing::trace;

use crate::host::{HostTag, HostEnd, HostByte, HostShort, HostInt, HostLong, HostFloat,
    HostDouble, HostByteArray, HostIntArray, HostString, HostList, HostCompound};
use crate::nbt::{Nbt, NbtTag, NbtList, NbtCompound};
use crate::config;

use self::access::{CompoundAccess, AccessPathError};


/// Convert a host tag tree into a portable one, see [`Converter::to_portable`].
#[inline]
pub fn to_portable(host: Option<&dyn HostTag>) -> Result<Option<NbtTag>, ConvertError> {
    Converter::from_env().to_portable(host)
}

/// Convert a portable tag tree into a host one, see [`Converter::to_host`].
#[inline]
pub fn to_host(tag: Option<&NbtTag>) -> Result<Option<Box<dyn HostTag>>, ConvertError> {
    Converter::from_env().to_host(tag)
}


/// A converter between host and portable trees, holding the compound access strategy
/// and an optional bound on the depth of converted trees.
#[derive(Clone, Copy)]
pub struct Converter<'a> {
    access: &'a CompoundAccess,
    max_depth: Option<usize>,
}

impl Converter<'static> {

    /// A converter using the global compound access strategy and no depth bound.
    pub fn new() -> Self {
        Self {
            access: CompoundAccess::global(),
            max_depth: None,
        }
    }

    /// Same as [`Self::new`], but the depth bound is taken from the environment, see
    /// [`config::max_depth`].
    pub fn from_env() -> Self {
        Self {
            access: CompoundAccess::global(),
            max_depth: config::max_depth(),
        }
    }

}

impl Default for Converter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Converter<'a> {

    /// Use the given compound access strategy instead of the global one.
    pub fn with_access<'b>(self, access: &'b CompoundAccess) -> Converter<'b> {
        Converter { access, max_depth: self.max_depth }
    }

    /// Reject trees with more than the given number of nested levels, the root tag
    /// being the first level.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Convert a host tag tree into a new portable tree, the host tree is left untouched.
    ///
    /// A list's declared kind is the kind of its last element, or byte if empty.
    pub fn to_portable(&self, host: Option<&dyn HostTag>) -> Result<Option<NbtTag>, ConvertError> {
        let Some(host) = host else { return Ok(None) };
        let tag = self.portable_from(host, 1)?;
        trace!("converted host {} to portable {:?}", host.type_name(), tag.kind());
        Ok(Some(tag))
    }

    /// Convert a portable tag tree into a new host tree.
    pub fn to_host(&self, tag: Option<&NbtTag>) -> Result<Option<Box<dyn HostTag>>, ConvertError> {
        let Some(tag) = tag else { return Ok(None) };
        let host = self.host_from(tag, 1)?;
        trace!("converted portable {:?} to host {}", tag.kind(), host.type_name());
        Ok(Some(host))
    }

    fn check_depth(&self, depth: usize) -> Result<(), ConvertError> {
        match self.max_depth {
            Some(max_depth) if depth > max_depth => Err(ConvertError::DepthExceeded { max_depth }),
            _ => Ok(())
        }
    }

    fn portable_from(&self, host: &dyn HostTag, depth: usize) -> Result<NbtTag, ConvertError> {

        self.check_depth(depth)?;

        let any = host.as_any();
        let value = if let Some(comp) = any.downcast_ref::<HostCompound>() {
            let mut values = NbtCompound::new();
            for child in self.access.children_of(comp)? {
                values.insert(self.portable_from(child, depth + 1)?);
            }
            Nbt::Compound(values)
        } else if let Some(list) = any.downcast_ref::<HostList>() {
            let mut values = NbtList::new();
            for child in list.iter() {
                values.push(self.portable_from(child, depth + 1)?);
            }
            Nbt::List(values)
        } else if let Some(tag) = any.downcast_ref::<HostByte>() {
            Nbt::Byte(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostShort>() {
            Nbt::Short(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostInt>() {
            Nbt::Int(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostLong>() {
            Nbt::Long(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostFloat>() {
            Nbt::Float(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostDouble>() {
            Nbt::Double(tag.data)
        } else if let Some(tag) = any.downcast_ref::<HostByteArray>() {
            Nbt::ByteArray(tag.data.clone())
        } else if let Some(tag) = any.downcast_ref::<HostIntArray>() {
            Nbt::IntArray(tag.data.clone())
        } else if let Some(tag) = any.downcast_ref::<HostString>() {
            Nbt::String(tag.data.clone())
        } else if any.is::<HostEnd>() {
            Nbt::End
        } else {
            return Err(ConvertError::UnrecognizedTagKind {
                id: host.id(),
                type_name: host.type_name(),
            });
        };

        Ok(NbtTag::new(host.name(), value))

    }

    fn host_from(&self, tag: &NbtTag, depth: usize) -> Result<Box<dyn HostTag>, ConvertError> {

        self.check_depth(depth)?;

        let name = tag.name();
        let host: Box<dyn HostTag> = match tag.value() {
            Nbt::End => Box::new(HostEnd),
            Nbt::Byte(n) => Box::new(HostByte::new(name, *n)),
            Nbt::Short(n) => Box::new(HostShort::new(name, *n)),
            Nbt::Int(n) => Box::new(HostInt::new(name, *n)),
            Nbt::Long(n) => Box::new(HostLong::new(name, *n)),
            Nbt::Float(n) => Box::new(HostFloat::new(name, *n)),
            Nbt::Double(n) => Box::new(HostDouble::new(name, *n)),
            Nbt::ByteArray(buf) => Box::new(HostByteArray::new(name, buf.clone())),
            Nbt::IntArray(buf) => Box::new(HostIntArray::new(name, buf.clone())),
            Nbt::String(string) => Box::new(HostString::new(name, string.clone())),
            Nbt::List(list) => {
                let mut host = HostList::new(name);
                for child in list {
                    host.append(self.host_from(child, depth + 1)?);
                }
                Box::new(host)
            }
            Nbt::Compound(comp) => {
                let mut host = HostCompound::new(name);
                for child in comp.iter() {
                    host.set_tag(child.name(), self.host_from(child, depth + 1)?);
                }
                Box::new(host)
            }
        };

        Ok(host)

    }

}


/// Error type returned by conversions, none of them is recoverable for the call.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// The tag's runtime kind is not one of the known tag kinds.
    #[error("unrecognized tag kind {id} ({type_name})")]
    UnrecognizedTagKind {
        id: i8,
        type_name: &'static str,
    },
    /// No path to the children of a host compound is usable.
    #[error("compound children are unreachable: {0}")]
    AccessUnavailable(AccessPathError),
    /// The tree is deeper than the configured bound.
    #[error("tree exceeds the maximum depth of {max_depth}")]
    DepthExceeded {
        max_depth: usize,
    },
}
