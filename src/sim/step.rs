/// Move engine and interaction resolver.
///
/// Processing order for one input:
///   1. Movement: the destination is checked against the live metadata
///      (`rules::check_move`). Walls and locked doors reject the move;
///      anything else moves the player and appends to the move sequence.
///   2. Interactions: the tile the player now stands on is resolved
///      (goal → victory, key → unlock doors, passage → teleport).
///
/// Teleport arrivals are not resolved again, so standing on the far end of
/// a passage does nothing until the player steps off and back on.

use thiserror::Error;

use crate::domain::entity::{MoveDir, Position};
use crate::domain::meta::Meta;
use crate::domain::rules::{self, MoveCheck};
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::session::{GameSession, SessionError};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("passage {id} at {at} has no partner, disabled")]
    UnpairedPassage { at: Position, id: i32 },
}

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

/// Move then resolve, reporting everything that happened.
pub fn step(session: &mut GameSession, dir: MoveDir) -> Result<Vec<GameEvent>, SessionError> {
    let mut events = vec![];
    match apply_move(session, dir)? {
        Outcome::Moved { from, to } => {
            events.push(GameEvent::Moved { from, to });
            events.extend(resolve_interactions(session));
        }
        Outcome::Bumped { at, tile } => events.push(GameEvent::Bumped { at, tile }),
        Outcome::Finished => {}
    }
    Ok(events)
}

/// Validate and apply one move. `Ok(true)` when the player moved and the
/// move was recorded; `Ok(false)` when it was rejected and nothing changed.
pub fn attempt_move(session: &mut GameSession, dir: MoveDir) -> Result<bool, SessionError> {
    Ok(matches!(apply_move(session, dir)?, Outcome::Moved { .. }))
}

/// Apply the effect of the tile under the player.
pub fn resolve_interactions(session: &mut GameSession) -> Vec<GameEvent> {
    let mut events = vec![];
    let here = session.player;
    let meta = session.meta_at(here);
    if meta.is_error() {
        return events;
    }

    match (session.level.tile_at(here), meta) {
        (Tile::Goal, _) => {
            session.victory = true;
            log::info!("Goal reached at {} after {} moves", here, session.move_count());
            events.push(GameEvent::GoalReached { at: here });
        }
        (Tile::Key, Meta::Id(id)) => collect_key(session, here, id, &mut events),
        (Tile::Passage, Meta::Id(id)) => enter_passage(session, here, id, &mut events),
        _ => {}
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

enum Outcome {
    Moved { from: Position, to: Position },
    Bumped { at: Position, tile: Tile },
    /// The session already ended in victory.
    Finished,
}

fn apply_move(session: &mut GameSession, dir: MoveDir) -> Result<Outcome, SessionError> {
    if session.victory {
        return Ok(Outcome::Finished);
    }
    let from = session.player;
    let check = rules::check_move(&session.view(), from, dir);
    match check {
        MoveCheck::OffGrid => {
            log::error!("Move {:?} from {} leaves the room", dir, from);
            Err(SessionError::OffGrid { from, dir })
        }
        MoveCheck::Blocked(at, tile) => Ok(Outcome::Bumped { at, tile }),
        MoveCheck::Open(to) => {
            session.player = to;
            session.moves.push(dir);
            Ok(Outcome::Moved { from, to })
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Interactions
// ══════════════════════════════════════════════════════════════

fn collect_key(session: &mut GameSession, at: Position, id: i32, events: &mut Vec<GameEvent>) {
    let doors = rules::doors_with_id(&session.view(), id);
    for door in &doors {
        session.set_meta(*door, Meta::Unlocked);
        events.push(GameEvent::DoorUnlocked { at: *door, id });
    }
    session.set_meta(at, Meta::Unlocked);

    if doors.is_empty() {
        log::warn!("Key {} at {} opens no doors", id, at);
    } else {
        log::info!("Key {} at {} unlocked {} door(s)", id, at, doors.len());
    }
    events.push(GameEvent::KeyCollected { at, id, doors: doors.len() });
}

fn enter_passage(session: &mut GameSession, at: Position, id: i32, events: &mut Vec<GameEvent>) {
    let partner = rules::paired_passage(&session.view(), at, id);
    match partner {
        Some(to) => {
            session.player = to;
            log::info!("Passage {} teleported {} -> {}", id, at, to);
            events.push(GameEvent::Teleported { from: at, to, id });
        }
        None => {
            session.set_meta(at, Meta::ErrorState);
            log::error!("{}", InteractionError::UnpairedPassage { at, id });
            events.push(GameEvent::PassageBroken { at, id });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
