/// Level geometry: every room's tiles plus the metadata they start with.
///
/// Rooms are square (`room_width` × `room_width`) and stored back to back in
/// flat buffers. Cell order inside the buffers is room-ascending, then
/// row-major, which is also the scan order for door and passage searches.

use super::entity::Position;
use super::meta::Meta;
use super::tile::Tile;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Level {
    pub room_width: usize,
    pub room_count: usize,
    tiles: Vec<Tile>,
    initial_meta: Vec<Meta>,
    pub start: Position,
}

impl Level {
    /// Assemble a level from parsed buffers. Both buffers must hold
    /// `room_count * room_width²` cells.
    pub(crate) fn from_parts(
        room_width: usize,
        room_count: usize,
        tiles: Vec<Tile>,
        initial_meta: Vec<Meta>,
        start: Position,
    ) -> Self {
        debug_assert_eq!(tiles.len(), room_count * room_width * room_width);
        debug_assert_eq!(tiles.len(), initial_meta.len());
        Level { room_width, room_count, tiles, initial_meta, start }
    }

    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn room_area(&self) -> usize {
        self.room_width * self.room_width
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.room < self.room_count && pos.row < self.room_width && pos.col < self.room_width
    }

    /// Flat buffer index of a cell. Panics on a position outside the level.
    pub fn index(&self, pos: Position) -> usize {
        assert!(self.contains(pos), "position {pos} outside level");
        pos.room * self.room_area() + pos.row * self.room_width + pos.col
    }

    pub fn position_of(&self, index: usize) -> Position {
        let area = self.room_area();
        let within = index % area;
        Position::new(index / area, within / self.room_width, within % self.room_width)
    }

    pub fn tile_at(&self, pos: Position) -> Tile {
        self.tiles[self.index(pos)]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Metadata as parsed. Never mutated; sessions copy it on start/restart.
    pub fn initial_meta(&self) -> &[Meta] {
        &self.initial_meta
    }

    /// One room's tiles, row-major.
    pub fn room_tiles(&self, room: usize) -> &[Tile] {
        let area = self.room_area();
        &self.tiles[room * area..(room + 1) * area]
    }
}
