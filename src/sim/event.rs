/// Events emitted while applying a move.
/// The presentation layer consumes these for sound and status messages.

use crate::domain::entity::Position;
use crate::domain::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { from: Position, to: Position },
    Bumped { at: Position, tile: Tile },
    GoalReached { at: Position },
    KeyCollected { at: Position, id: i32, doors: usize },
    DoorUnlocked { at: Position, id: i32 },
    Teleported { from: Position, to: Position, id: i32 },
    PassageBroken { at: Position, id: i32 },
}
