//! Lossless conversion between the NBT tag trees of a host runtime and a portable NBT
//! tag tree owned by this crate.

pub mod nbt;
pub mod host;
pub mod convert;

pub mod block;
pub mod config;

pub use convert::{to_portable, to_host, Converter, ConvertError};
