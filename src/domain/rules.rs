/// Movement and interaction rules — truth-table driven.
///
/// Pure functions over the tile layer and a metadata layer — no side effects.
/// These encode "what is legal" and "what would happen" without doing it.
///
/// ## Movement Truth Table
///
/// ┌──────────────────────────────┬────────┬──────────────────────┐
/// │ Destination                   │ Allow? │ Notes                │
/// ├──────────────────────────────┼────────┼──────────────────────┤
/// │ outside [0, room_width)       │ ERROR  │ level authoring bug  │
/// │ Wall                          │ DENY   │                      │
/// │ Door, metadata ≠ Unlocked     │ DENY   │ locked or flagged    │
/// │ Door, metadata = Unlocked     │ ALLOW  │ residue              │
/// │ Void/Key/Passage/Start/Goal   │ ALLOW  │                      │
/// │ Text                          │ ALLOW  │ display only         │
/// └──────────────────────────────┴────────┴──────────────────────┘
///
/// Movement never crosses rooms; only passages do.
///
/// ## Interaction Table (tile the player now stands on)
///
/// ┌──────────────────────────────┬──────────────────────────────────┐
/// │ Condition (priority order)    │ Effect                           │
/// ├──────────────────────────────┼──────────────────────────────────┤
/// │ metadata = ErrorState         │ nothing                          │
/// │ Goal                          │ victory                          │
/// │ Key, metadata = Id(k)         │ unlock every Door Id(k), collect │
/// │ Passage, metadata = Id(k)     │ teleport to the other Passage    │
/// │                               │ Id(k); none → flag ErrorState    │
/// │ otherwise                     │ nothing                          │
/// └──────────────────────────────┴──────────────────────────────────┘

use super::entity::{MoveDir, Position};
use super::map::Level;
use super::meta::Meta;
use super::tile::Tile;

/// Immutable view of a level's tiles with a given metadata layer.
pub struct MapView<'a> {
    pub level: &'a Level,
    pub meta: &'a [Meta],
}

impl<'a> MapView<'a> {
    pub fn new(level: &'a Level, meta: &'a [Meta]) -> Self {
        debug_assert_eq!(level.cell_count(), meta.len());
        MapView { level, meta }
    }

    pub fn tile_at(&self, pos: Position) -> Tile {
        self.level.tile_at(pos)
    }

    pub fn meta_at(&self, pos: Position) -> Meta {
        self.meta[self.level.index(pos)]
    }

    /// Cells in scan order (room-ascending, row-major).
    fn cells(&self) -> impl Iterator<Item = (Position, Tile, Meta)> + '_ {
        self.level
            .tiles()
            .iter()
            .zip(self.meta.iter())
            .enumerate()
            .map(|(i, (t, m))| (self.level.position_of(i), *t, *m))
    }
}

/// Result of checking a single step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveCheck {
    Open(Position),
    Blocked(Position, Tile),
    /// The step leaves the room grid.
    OffGrid,
}

/// One step from `pos` in `dir`, inside the same room.
pub fn target(pos: Position, dir: MoveDir, room_width: usize) -> Option<Position> {
    let (dr, dc) = dir.delta();
    let row = pos.row.checked_add_signed(dr)?;
    let col = pos.col.checked_add_signed(dc)?;
    if row >= room_width || col >= room_width {
        return None;
    }
    Some(Position { row, col, ..pos })
}

/// Can the player stand on this cell?
pub fn can_enter(tile: Tile, meta: Meta) -> bool {
    if tile.is_wall() { return false; }
    if tile.is_door() { return meta.is_unlocked(); }
    true
}

pub fn check_move(map: &MapView, pos: Position, dir: MoveDir) -> MoveCheck {
    let dest = match target(pos, dir, map.level.room_width) {
        Some(d) => d,
        None => return MoveCheck::OffGrid,
    };
    let tile = map.tile_at(dest);
    if can_enter(tile, map.meta_at(dest)) {
        MoveCheck::Open(dest)
    } else {
        MoveCheck::Blocked(dest, tile)
    }
}

/// Every Door carrying `id`, in scan order.
pub fn doors_with_id(map: &MapView, id: i32) -> Vec<Position> {
    map.cells()
        .filter(|(_, t, m)| *t == Tile::Door && *m == Meta::Id(id))
        .map(|(p, _, _)| p)
        .collect()
}

/// First Passage carrying `id` that is not `from`, in scan order.
pub fn paired_passage(map: &MapView, from: Position, id: i32) -> Option<Position> {
    map.cells()
        .find(|(p, t, m)| *t == Tile::Passage && *m == Meta::Id(id) && *p != from)
        .map(|(p, _, _)| p)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
