/// Replay driver: rebuild a session from a level and a recorded move list.
///
/// Every recorded move goes back through the move engine, so a save made
/// against an older version of a level cannot walk through walls. What
/// happens to a move that is no longer legal depends on [`ReplayPolicy`].

use crate::domain::entity::MoveSequence;
use crate::domain::map::Level;
use super::session::{GameSession, SessionError};
use super::step::{attempt_move, resolve_interactions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Illegal moves are logged and skipped.
    #[default]
    Lenient,
    /// The first illegal move fails the replay.
    Strict,
}

impl ReplayPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { ReplayPolicy::Strict } else { ReplayPolicy::Lenient }
    }
}

#[derive(Clone, Debug)]
pub struct Replay {
    pub session: GameSession,
    /// Indices into the recorded sequence of moves that were rejected.
    pub skipped: Vec<usize>,
    /// Recorded moves that came after the goal was reached.
    pub after_victory: usize,
}

impl Replay {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.after_victory == 0
    }
}

pub fn replay(level: &Level, moves: &MoveSequence, policy: ReplayPolicy) -> Result<Replay, SessionError> {
    let mut session = GameSession::new(level.clone());
    let mut skipped = vec![];
    let mut after_victory = 0;

    for (index, dir) in moves.iter().enumerate() {
        if session.victory() {
            after_victory += 1;
            continue;
        }
        if attempt_move(&mut session, dir)? {
            resolve_interactions(&mut session);
            continue;
        }
        match policy {
            ReplayPolicy::Strict => {
                log::error!("Replay stopped: move #{} ('{}') is illegal", index, dir.key());
                return Err(SessionError::IllegalRecordedMove { index, key: dir.key() });
            }
            ReplayPolicy::Lenient => {
                log::warn!("Replay skipped illegal move #{} ('{}')", index, dir.key());
                skipped.push(index);
            }
        }
    }

    if after_victory > 0 {
        log::warn!("Replay ignored {} moves recorded after the goal", after_victory);
    }
    log::info!(
        "Replayed {} of {} moves, player at {}",
        session.move_count(),
        moves.len(),
        session.player(),
    );
    Ok(Replay { session, skipped, after_victory })
}
