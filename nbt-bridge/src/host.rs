//! Host side NBT object model, mirroring the tag classes owned by the host runtime.
//!
//! Unlike the portable [`Nbt`](crate::nbt::Nbt) enumeration, the host tag set is open:
//! any type implementing [`HostTag`] may cross the boundary, including kinds that the
//! conversion engine does not know about.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;


pub const TAG_END        : i8 = 0;
pub const TAG_BYTE       : i8 = 1;
pub const TAG_SHORT      : i8 = 2;
pub const TAG_INT        : i8 = 3;
pub const TAG_LONG       : i8 = 4;
pub const TAG_FLOAT      : i8 = 5;
pub const TAG_DOUBLE     : i8 = 6;
pub const TAG_BYTE_ARRAY : i8 = 7;
pub const TAG_STRING     : i8 = 8;
pub const TAG_LIST       : i8 = 9;
pub const TAG_COMPOUND   : i8 = 10;
pub const TAG_INT_ARRAY  : i8 = 11;


/// Base trait of every host tag.
pub trait HostTag: Any + fmt::Debug + Send + Sync {

    /// The host kind identifier of this tag.
    fn id(&self) -> i8;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_box(&self) -> Box<dyn HostTag>;

    /// Compare this tag with another dynamic tag, tags of different types are unequal.
    fn dyn_eq(&self, other: &dyn HostTag) -> bool;

    /// Name of the concrete type behind this tag, used when reporting unknown kinds.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

}

impl PartialEq for dyn HostTag {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl Clone for Box<dyn HostTag> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}


/// Internal macro implementing the dynamic plumbing methods of [`HostTag`].
macro_rules! host_tag_common {
    () => {

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }

        fn clone_box(&self) -> Box<dyn HostTag> {
            Box::new(self.clone())
        }

        fn dyn_eq(&self, other: &dyn HostTag) -> bool {
            other.as_any().downcast_ref::<Self>().is_some_and(|other| self == other)
        }

    };
}

/// Internal macro to define named host tags holding a single data field.
macro_rules! host_data_tags {
    (
        $($ident:ident($data:ty) = $id:ident),* $(,)?
    ) => {
        $(

            #[derive(Debug, Clone, PartialEq)]
            pub struct $ident {
                name: String,
                pub data: $data,
            }

            impl $ident {
                pub fn new(name: impl Into<String>, data: $data) -> Self {
                    Self { name: name.into(), data }
                }
            }

            impl HostTag for $ident {

                fn id(&self) -> i8 {
                    $id
                }

                fn name(&self) -> &str {
                    &self.name
                }

                fn set_name(&mut self, name: String) {
                    self.name = name;
                }

                host_tag_common!();

            }

        )*
    };
}

host_data_tags! {
    HostByte(i8)            = TAG_BYTE,
    HostShort(i16)          = TAG_SHORT,
    HostInt(i32)            = TAG_INT,
    HostLong(i64)           = TAG_LONG,
    HostFloat(f32)          = TAG_FLOAT,
    HostDouble(f64)         = TAG_DOUBLE,
    HostByteArray(Vec<i8>)  = TAG_BYTE_ARRAY,
    HostIntArray(Vec<i32>)  = TAG_INT_ARRAY,
    HostString(String)      = TAG_STRING,
}


/// The host end tag, it has no name and no payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostEnd;

impl HostTag for HostEnd {

    fn id(&self) -> i8 {
        TAG_END
    }

    fn name(&self) -> &str {
        ""
    }

    fn set_name(&mut self, _name: String) {}

    host_tag_common!();

}


/// The host list tag, its element type is updated on every append.
#[derive(Debug, Clone, PartialEq)]
pub struct HostList {
    name: String,
    tag_type: i8,
    list: Vec<Box<dyn HostTag>>,
}

impl HostList {

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), tag_type: TAG_BYTE, list: Vec::new() }
    }

    /// Append a tag to this list, the list's element type becomes this tag's type.
    pub fn append(&mut self, tag: Box<dyn HostTag>) {
        self.tag_type = tag.id();
        self.list.push(tag);
    }

    /// The element type of this list, byte if nothing has been appended yet.
    #[inline]
    pub fn tag_type(&self) -> i8 {
        self.tag_type
    }

    #[inline]
    pub fn tag_count(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn tag_at(&self, index: usize) -> Option<&dyn HostTag> {
        self.list.get(index).map(|tag| &**tag)
    }

    /// Iterate over the tags of this list, in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn HostTag> + '_ {
        self.list.iter().map(|tag| &**tag)
    }

}

impl HostTag for HostList {

    fn id(&self) -> i8 {
        TAG_LIST
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    host_tag_common!();

}


/// The host compound tag.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCompound {
    name: String,
    map: IndexMap<String, Box<dyn HostTag>>,
}

impl HostCompound {

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), map: IndexMap::new() }
    }

    /// Store a tag under the given key, the tag is renamed to the key and any tag
    /// previously stored under it is replaced.
    pub fn set_tag(&mut self, key: impl Into<String>, mut tag: Box<dyn HostTag>) {
        let key = key.into();
        tag.set_name(key.clone());
        self.map.insert(key, tag);
    }

    #[inline]
    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        let key = key.into();
        self.set_tag(key.clone(), Box::new(HostInt::new(key, value)));
    }

    #[inline]
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.set_tag(key.clone(), Box::new(HostString::new(key, value.into())));
    }

    #[inline]
    pub fn get_tag(&self, key: &str) -> Option<&dyn HostTag> {
        self.map.get(key).map(|tag| &**tag)
    }

    #[inline]
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get_tag(key)?.as_any().downcast_ref::<HostInt>().map(|tag| tag.data)
    }

    #[inline]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get_tag(key)?.as_any().downcast_ref::<HostString>().map(|tag| tag.data.as_str())
    }

    #[inline]
    pub fn has_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Public accessor to all tags of this compound.
    pub fn tags(&self) -> impl Iterator<Item = &dyn HostTag> + '_ {
        self.map.values().map(|tag| &**tag)
    }

    /// Direct access to the internal mapping of this compound.
    #[inline]
    pub(crate) fn map(&self) -> &IndexMap<String, Box<dyn HostTag>> {
        &self.map
    }

}

impl HostTag for HostCompound {

    fn id(&self) -> i8 {
        TAG_COMPOUND
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    host_tag_common!();

}
