//! Blocks carrying tile entity data, and their transfer from and to a host world.

use glam::IVec3;
use tracing::{debug, instrument};

use crate::convert::{ConvertError, Converter};
use crate::host::HostCompound;
use crate::nbt::{Nbt, NbtCompound, NbtKind, NbtTag};


/// A block that may carry tile entity data in the portable format.
pub trait TileEntityBlock {

    /// The block id.
    fn id(&self) -> u8;

    /// The block metadata.
    fn metadata(&self) -> u8;

    /// Return true if this block carries tile entity data.
    fn has_nbt_data(&self) -> bool;

    /// The tile entity id found in the data, empty if there is none.
    fn nbt_id(&self) -> &str;

    /// Get a portable copy of the tile entity data.
    fn nbt_data(&self) -> Result<Option<NbtTag>, BlockError>;

    /// Replace the tile entity data, none to remove it.
    fn set_nbt_data(&mut self, tag: Option<NbtTag>) -> Result<(), BlockError>;

    /// Return this block as a [`TileBlock`] if it is one, its host data is then used
    /// directly.
    fn as_tile_block(&self) -> Option<&TileBlock> {
        None
    }

}


/// The host world API needed to transfer tile entity data.
pub trait HostWorld {

    /// Get the block id at the given position.
    fn block_id_at(&self, pos: IVec3) -> u8;

    /// Return true if blocks of the given id bear a tile entity.
    fn has_tile_entity(&self, id: u8) -> bool;

    /// Get the tile entity at the given position, if any.
    fn tile_entity_mut(&mut self, pos: IVec3) -> Option<&mut dyn HostTileEntity>;

    /// Set the block id and metadata at the given position, returning true if changed.
    fn set_block_and_metadata(&mut self, pos: IVec3, id: u8, metadata: u8) -> bool;

    /// Notify the block and its neighbors that the block has changed.
    fn notify_neighbors(&mut self, pos: IVec3, id: u8);

    /// Notify only the block itself that it has changed.
    fn notify_block_change(&mut self, pos: IVec3, id: u8);

}

/// A tile entity owned by the host world.
pub trait HostTileEntity {

    /// Save this tile entity into the given compound.
    fn write_to_nbt(&self, comp: &mut HostCompound);

    /// Load this tile entity from the given compound.
    fn read_from_nbt(&mut self, comp: &HostCompound);

}


/// A block with optional tile entity data kept in the host format.
#[derive(Debug, Clone)]
pub struct TileBlock {
    id: u8,
    metadata: u8,
    data: Option<HostCompound>,
}

impl TileBlock {

    pub fn new(id: u8, metadata: u8, data: Option<HostCompound>) -> Self {
        Self { id, metadata, data }
    }

    /// Create a new tile block from the data of another tile entity block, converted
    /// to the host format.
    pub fn from_block(id: u8, metadata: u8, block: &dyn TileEntityBlock) -> Result<Self, BlockError> {
        let data = host_compound(block.nbt_data()?.as_ref())?;
        Ok(Self { id, metadata, data })
    }

    /// Read the tile entity at the given position into a new block, none if this block
    /// id has no tile entity or if there is no tile entity at this position.
    #[instrument(level = "debug", skip(world))]
    pub fn get(world: &mut dyn HostWorld, pos: IVec3, id: u8, metadata: u8) -> Option<Self> {

        if !world.has_tile_entity(id) {
            return None;
        }

        let tile_entity = world.tile_entity_mut(pos)?;
        let mut data = HostCompound::new("");
        tile_entity.write_to_nbt(&mut data);
        Some(Self::new(id, metadata, Some(data)))

    }

    /// Load the tile entity data of the given block into the tile entity at the given
    /// position. Returns true if data has been copied to the world.
    #[instrument(level = "debug", skip(world, block))]
    pub fn set(world: &mut dyn HostWorld, pos: IVec3, block: &dyn TileEntityBlock) -> Result<bool, BlockError> {

        if !world.has_tile_entity(world.block_id_at(pos)) {
            return Ok(false);
        }

        let mut proxy = match block.as_tile_block() {
            Some(tile_block) => tile_block.clone(),
            None => Self::from_block(block.id(), block.metadata(), block)?,
        };

        let Some(data) = proxy.host_data_at(pos) else {
            return Ok(false);
        };

        let Some(tile_entity) = world.tile_entity_mut(pos) else {
            return Ok(false);
        };

        tile_entity.read_from_nbt(data);
        debug!("loaded tile entity {:?}", data.get_string("id").unwrap_or_default());
        Ok(true)

    }

    /// Set the block and its tile entity data at the given position, physics is only
    /// notified at the end and only if the block id or metadata changed. Returns true
    /// if the block id or metadata changed. Physics is notified even if the tile entity
    /// data can't be copied, because the block itself has already been placed.
    pub fn set_safely(world: &mut dyn HostWorld, pos: IVec3, block: &dyn TileEntityBlock, notify_adjacent: bool) -> Result<bool, BlockError> {

        let changed = world.set_block_and_metadata(pos, block.id(), block.metadata());

        let copied = Self::set(world, pos, block);

        if changed {
            if notify_adjacent {
                world.notify_neighbors(pos, block.id());
            } else {
                world.notify_block_change(pos, block.id());
            }
        }

        copied?;
        Ok(changed)

    }

    /// Stamp the given position into the host data and return it, none if this block
    /// has no data.
    pub fn host_data_at(&mut self, pos: IVec3) -> Option<&HostCompound> {
        let data = self.data.as_mut()?;
        data.set_int("x", pos.x);
        data.set_int("y", pos.y);
        data.set_int("z", pos.z);
        Some(data)
    }

    #[inline]
    pub fn host_data(&self) -> Option<&HostCompound> {
        self.data.as_ref()
    }

}

impl TileEntityBlock for TileBlock {

    fn id(&self) -> u8 {
        self.id
    }

    fn metadata(&self) -> u8 {
        self.metadata
    }

    fn has_nbt_data(&self) -> bool {
        self.data.is_some()
    }

    fn nbt_id(&self) -> &str {
        self.data.as_ref()
            .and_then(|data| data.get_string("id"))
            .unwrap_or("")
    }

    /// Without host data, this returns an empty compound named after the tile entity id.
    fn nbt_data(&self) -> Result<Option<NbtTag>, BlockError> {
        match &self.data {
            Some(data) => Ok(Converter::from_env().to_portable(Some(data))?),
            None => Ok(Some(NbtTag::new(self.nbt_id(), Nbt::Compound(NbtCompound::new())))),
        }
    }

    fn set_nbt_data(&mut self, tag: Option<NbtTag>) -> Result<(), BlockError> {
        self.data = host_compound(tag.as_ref())?;
        Ok(())
    }

    fn as_tile_block(&self) -> Option<&TileBlock> {
        Some(self)
    }

}


/// A block with optional tile entity data kept in the portable format.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseTileBlock {
    pub id: u8,
    pub metadata: u8,
    pub data: Option<NbtTag>,
}

impl BaseTileBlock {

    pub fn new(id: u8, metadata: u8) -> Self {
        Self { id, metadata, data: None }
    }

    pub fn with_data(mut self, data: NbtTag) -> Self {
        self.data = Some(data);
        self
    }

}

impl TileEntityBlock for BaseTileBlock {

    fn id(&self) -> u8 {
        self.id
    }

    fn metadata(&self) -> u8 {
        self.metadata
    }

    fn has_nbt_data(&self) -> bool {
        self.data.is_some()
    }

    fn nbt_id(&self) -> &str {
        self.data.as_ref()
            .and_then(|data| data.value().as_compound())
            .and_then(|comp| comp.get_string("id"))
            .unwrap_or("")
    }

    fn nbt_data(&self) -> Result<Option<NbtTag>, BlockError> {
        Ok(self.data.clone())
    }

    fn set_nbt_data(&mut self, tag: Option<NbtTag>) -> Result<(), BlockError> {
        self.data = tag;
        Ok(())
    }

}


/// Convert optional portable data into a host compound.
fn host_compound(tag: Option<&NbtTag>) -> Result<Option<HostCompound>, BlockError> {
    let Some(host) = Converter::from_env().to_host(tag)? else {
        return Ok(None);
    };
    let kind = tag.map(NbtTag::kind).unwrap_or(NbtKind::End);
    match host.into_any().downcast::<HostCompound>() {
        Ok(comp) => Ok(Some(*comp)),
        Err(_) => Err(BlockError::NotCompound(kind)),
    }
}


/// Error type returned when transferring tile entity data.
#[derive(thiserror::Error, Debug)]
pub enum BlockError {
    #[error("convert: {0}")]
    Convert(#[from] ConvertError),
    #[error("tile entity data must be a compound, got {0:?}")]
    NotCompound(NbtKind),
}


#[cfg(test)]
mod tests {

    use std::collections::HashMap;

    use crate::host::HostList;

    use super::*;

    const CHEST: u8 = 54;
    const STONE: u8 = 1;

    #[derive(Debug, Default)]
    struct ChestTileEntity {
        /// The last compound loaded into this tile entity.
        loaded: Option<HostCompound>,
    }

    impl HostTileEntity for ChestTileEntity {

        fn write_to_nbt(&self, comp: &mut HostCompound) {
            comp.set_string("id", "Chest");
            comp.set_tag("Items", Box::new(HostList::new("Items")));
        }

        fn read_from_nbt(&mut self, comp: &HostCompound) {
            self.loaded = Some(comp.clone());
        }

    }

    #[derive(Debug, PartialEq)]
    enum Notify {
        Neighbors(IVec3, u8),
        Block(IVec3, u8),
    }

    #[derive(Default)]
    struct TestWorld {
        blocks: HashMap<IVec3, (u8, u8)>,
        chests: HashMap<IVec3, ChestTileEntity>,
        notifications: Vec<Notify>,
    }

    impl HostWorld for TestWorld {

        fn block_id_at(&self, pos: IVec3) -> u8 {
            self.blocks.get(&pos).map(|&(id, _)| id).unwrap_or(0)
        }

        fn has_tile_entity(&self, id: u8) -> bool {
            id == CHEST
        }

        fn tile_entity_mut(&mut self, pos: IVec3) -> Option<&mut dyn HostTileEntity> {
            self.chests.get_mut(&pos).map(|chest| chest as &mut dyn HostTileEntity)
        }

        fn set_block_and_metadata(&mut self, pos: IVec3, id: u8, metadata: u8) -> bool {
            let prev = self.blocks.insert(pos, (id, metadata));
            if id == CHEST {
                self.chests.entry(pos).or_default();
            }
            prev != Some((id, metadata))
        }

        fn notify_neighbors(&mut self, pos: IVec3, id: u8) {
            self.notifications.push(Notify::Neighbors(pos, id));
        }

        fn notify_block_change(&mut self, pos: IVec3, id: u8) {
            self.notifications.push(Notify::Block(pos, id));
        }

    }

    fn chest_data() -> NbtTag {
        let mut comp = NbtCompound::new();
        comp.insert_value("id", Nbt::String("Chest".to_string()));
        comp.insert_value("Items", Nbt::List(Default::default()));
        NbtTag::new("", Nbt::Compound(comp))
    }

    #[test]
    fn stamp_coordinates() {

        let mut block = TileBlock::from_block(CHEST, 2, &BaseTileBlock::new(CHEST, 2).with_data(chest_data())).unwrap();
        let data = block.host_data_at(IVec3::new(1, -2, 3)).unwrap();
        assert_eq!(data.get_int("x"), Some(1));
        assert_eq!(data.get_int("y"), Some(-2));
        assert_eq!(data.get_int("z"), Some(3));
        assert_eq!(data.get_tag("x").unwrap().name(), "x");

        let mut empty = TileBlock::new(STONE, 0, None);
        assert!(empty.host_data_at(IVec3::ZERO).is_none());

    }

    #[test]
    fn missing_data() {

        let block = TileBlock::new(CHEST, 0, None);
        assert!(!block.has_nbt_data());
        assert_eq!(block.nbt_id(), "");

        let tag = block.nbt_data().unwrap().unwrap();
        assert_eq!(tag.name(), "");
        assert!(tag.value().as_compound().unwrap().is_empty());

    }

    #[test]
    fn nbt_data_round_trip() {

        let mut block = TileBlock::new(CHEST, 0, None);
        block.set_nbt_data(Some(chest_data())).unwrap();
        assert!(block.has_nbt_data());
        assert_eq!(block.nbt_id(), "Chest");
        assert_eq!(block.nbt_data().unwrap().unwrap(), chest_data());

        block.set_nbt_data(None).unwrap();
        assert!(!block.has_nbt_data());

        let err = block.set_nbt_data(Some(NbtTag::new("", Nbt::Int(1)))).unwrap_err();
        assert!(matches!(err, BlockError::NotCompound(NbtKind::Int)));

    }

    #[test]
    fn get_from_world() {

        let mut world = TestWorld::default();
        let pos = IVec3::new(4, 64, 4);
        world.set_block_and_metadata(pos, CHEST, 0);

        let block = TileBlock::get(&mut world, pos, CHEST, 0).unwrap();
        assert_eq!(block.nbt_id(), "Chest");
        assert!(block.host_data().unwrap().has_key("Items"));

        assert!(TileBlock::get(&mut world, pos, STONE, 0).is_none());
        assert!(TileBlock::get(&mut world, IVec3::ZERO, CHEST, 0).is_none());

    }

    #[test]
    fn set_into_world() {

        let mut world = TestWorld::default();
        let pos = IVec3::new(-7, 12, 30);
        world.set_block_and_metadata(pos, CHEST, 0);

        let block = BaseTileBlock::new(CHEST, 0).with_data(chest_data());
        assert!(TileBlock::set(&mut world, pos, &block).unwrap());

        let loaded = world.chests[&pos].loaded.as_ref().unwrap();
        assert_eq!(loaded.get_string("id"), Some("Chest"));
        assert_eq!(loaded.get_int("x"), Some(-7));
        assert_eq!(loaded.get_int("y"), Some(12));
        assert_eq!(loaded.get_int("z"), Some(30));

        // No data or no tile entity bearing block at the position.
        assert!(!TileBlock::set(&mut world, pos, &BaseTileBlock::new(CHEST, 0)).unwrap());
        assert!(!TileBlock::set(&mut world, IVec3::ZERO, &block).unwrap());

    }

    #[test]
    fn set_tile_block_into_world() {

        let mut world = TestWorld::default();
        let from = IVec3::new(0, 10, 0);
        let to = IVec3::new(5, 10, 5);
        world.set_block_and_metadata(from, CHEST, 0);
        world.set_block_and_metadata(to, CHEST, 0);

        let block = TileBlock::get(&mut world, from, CHEST, 0).unwrap();
        assert!(TileBlock::set(&mut world, to, &block).unwrap());
        assert_eq!(world.chests[&to].loaded.as_ref().unwrap().get_int("x"), Some(5));

        // The block itself is not stamped.
        assert!(!block.host_data().unwrap().has_key("x"));

    }

    #[test]
    fn set_safely_notifies_on_change() {

        let mut world = TestWorld::default();
        let pos = IVec3::new(1, 2, 3);
        let block = BaseTileBlock::new(CHEST, 0).with_data(chest_data());

        assert!(TileBlock::set_safely(&mut world, pos, &block, true).unwrap());
        assert_eq!(world.notifications, [Notify::Neighbors(pos, CHEST)]);
        assert!(world.chests[&pos].loaded.is_some());

        assert!(!TileBlock::set_safely(&mut world, pos, &block, false).unwrap());
        assert_eq!(world.notifications.len(), 1);

        let stone = BaseTileBlock::new(STONE, 0);
        assert!(TileBlock::set_safely(&mut world, pos, &stone, false).unwrap());
        assert_eq!(world.notifications[1], Notify::Block(pos, STONE));

    }

    #[test]
    fn set_safely_notifies_when_copy_fails() {

        let mut world = TestWorld::default();
        let pos = IVec3::new(-4, 64, 9);
        let block = BaseTileBlock::new(CHEST, 3).with_data(NbtTag::new("", Nbt::Int(1)));

        let res = TileBlock::set_safely(&mut world, pos, &block, true);
        assert!(matches!(res, Err(BlockError::NotCompound(NbtKind::Int))), "{res:?}");
        assert_eq!(world.blocks[&pos], (CHEST, 3));
        assert_eq!(world.notifications, [Notify::Neighbors(pos, CHEST)]);
        assert!(world.chests[&pos].loaded.is_none());

    }

}
