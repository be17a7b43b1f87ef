/// Game session: one level plus everything a play-through changes.
///
/// The level (tiles and initial metadata) is never touched after parsing.
/// The session owns the live metadata layer, which starts as a copy of the
/// level's initial metadata and is reset from it on restart, the same way a
/// freshly loaded level would start.

use thiserror::Error;

use crate::domain::entity::{MoveDir, MoveSequence, Position};
use crate::domain::map::Level;
use crate::domain::meta::Meta;
use crate::domain::rules::MapView;
use crate::domain::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The neighbouring cell lies outside the room. Levels are expected to
    /// wall in every walkable edge cell, so this is an authoring error.
    #[error("moving {dir:?} from {from} leaves the room")]
    OffGrid { from: Position, dir: MoveDir },

    #[error("recorded move #{index} ('{key}') is not legal here")]
    IllegalRecordedMove { index: usize, key: char },
}

#[derive(Clone, Debug)]
pub struct GameSession {
    pub(crate) level: Level,
    pub(crate) meta: Vec<Meta>,
    pub(crate) player: Position,
    pub(crate) victory: bool,
    pub(crate) moves: MoveSequence,
}

impl GameSession {
    pub fn new(level: Level) -> Self {
        let meta = level.initial_meta().to_vec();
        let player = level.start;
        GameSession {
            level,
            meta,
            player,
            victory: false,
            moves: MoveSequence::new(),
        }
    }

    /// Back to the level's initial state with an empty move sequence.
    pub fn restart(&mut self) {
        self.meta.clear();
        self.meta.extend_from_slice(self.level.initial_meta());
        self.player = self.level.start;
        self.victory = false;
        self.moves = MoveSequence::new();
        log::info!("Session restarted");
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn victory(&self) -> bool {
        self.victory
    }

    pub fn moves(&self) -> &MoveSequence {
        &self.moves
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Live metadata for the whole level, in cell order.
    pub fn meta(&self) -> &[Meta] {
        &self.meta
    }

    pub fn meta_at(&self, pos: Position) -> Meta {
        self.meta[self.level.index(pos)]
    }

    pub fn view(&self) -> MapView<'_> {
        MapView::new(&self.level, &self.meta)
    }

    // ── Active room (the one the player is in) ──

    pub fn room_tiles(&self) -> &[Tile] {
        self.level.room_tiles(self.player.room)
    }

    pub fn room_meta(&self) -> &[Meta] {
        let area = self.level.room_area();
        let room = self.player.room;
        &self.meta[room * area..(room + 1) * area]
    }

    /// Active room metadata in the legacy integer encoding.
    pub fn room_raw_meta(&self) -> Vec<i32> {
        self.room_meta().iter().map(|m| m.to_raw()).collect()
    }

    pub(crate) fn set_meta(&mut self, pos: Position, meta: Meta) {
        let i = self.level.index(pos);
        self.meta[i] = meta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::parse_level;

    fn session(text: &str) -> GameSession {
        GameSession::new(parse_level(text).unwrap().level)
    }

    const TWO: &str = "WIDTH 2\nBEGIN\n@! 3\n##\n$& 3\n##\nEND\n";

    #[test]
    fn starts_on_start_tile_with_level_meta() {
        let s = session(TWO);
        assert_eq!(s.player(), Position::new(0, 0, 0));
        assert_eq!(s.meta(), s.level().initial_meta());
        assert!(!s.victory());
        assert_eq!(s.move_count(), 0);
    }

    #[test]
    fn active_room_views_follow_player() {
        let mut s = session(TWO);
        assert_eq!(s.room_tiles(), &[Tile::Start, Tile::Key, Tile::Wall, Tile::Wall]);
        assert_eq!(s.room_raw_meta(), vec![-1, 3, -1, -1]);
        s.player = Position::new(1, 0, 0);
        assert_eq!(s.room_tiles()[1], Tile::Door);
        assert_eq!(s.room_meta()[1], Meta::Id(3));
    }

    #[test]
    fn restart_restores_initial_state() {
        let mut s = session(TWO);
        s.set_meta(Position::new(1, 0, 1), Meta::Unlocked);
        s.player = Position::new(1, 0, 0);
        s.victory = true;
        s.moves.push(MoveDir::Right);

        s.restart();
        assert_eq!(s.meta_at(Position::new(1, 0, 1)), Meta::Id(3));
        assert_eq!(s.player(), s.level().start);
        assert!(!s.victory());
        assert!(s.moves().is_empty());
    }
}
