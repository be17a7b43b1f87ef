/// Save and load game progress as recorded move sequences.
///
/// ## Layout (under the data directory):
///   `games/<level>/ongoing/<player>.bin`   games paused with "Save and Quit"
///   `games/<level>/finished/<player>.bin`  completed games (leaderboard)
///
/// ## File format:
///   4-byte little-endian signed move count, then exactly that many bytes,
///   each one of `w`, `s`, `a`, `d`. No header, no trailer. An empty file
///   is an empty sequence.
///
/// Only moves are stored. Position, keys and doors are rebuilt by replaying
/// the moves on a freshly parsed level.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entity::{MoveDir, MoveSequence};
use crate::domain::map::Level;
use crate::store::{Storage, StoreError};
use super::replay::{replay, Replay, ReplayPolicy};
use super::session::SessionError;

pub const GAMES_DIR: &str = "games";
pub const SAVE_EXT: &str = "bin";
pub const DEFAULT_PLAYER: &str = "Anonymous";

const COUNT_LEN: usize = 4;

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("save is truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("save declares a negative move count ({0})")]
    NegativeCount(i32),
    #[error("save has {0} bytes after the last move")]
    TrailingBytes(usize),
    #[error("byte {byte:#04x} at offset {offset} is not a move")]
    BadMove { offset: usize, byte: u8 },
    #[error("replaying save failed: {0}")]
    Replay(#[from] SessionError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SaveKind {
    Ongoing,
    Finished,
}

impl SaveKind {
    fn dir_name(self) -> &'static str {
        match self {
            SaveKind::Ongoing => "ongoing",
            SaveKind::Finished => "finished",
        }
    }
}

/// One row of a level's leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: String,
    /// `None` when the save could not be read.
    pub moves: Option<usize>,
}

// ══════════════════════════════════════════════════════════════
// Codec
// ══════════════════════════════════════════════════════════════

pub fn encode_moves(moves: &MoveSequence) -> Vec<u8> {
    let keys = moves.to_keys();
    let count = i32::try_from(keys.len()).unwrap_or(i32::MAX);
    let mut out = Vec::with_capacity(COUNT_LEN + keys.len());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&keys[..count as usize]);
    out
}

pub fn decode_moves(bytes: &[u8]) -> Result<MoveSequence, SaveError> {
    if bytes.is_empty() {
        return Ok(MoveSequence::new());
    }
    let header: [u8; COUNT_LEN] = bytes
        .get(..COUNT_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(SaveError::Truncated { expected: COUNT_LEN, found: bytes.len() })?;
    let count = i32::from_le_bytes(header);
    let count = usize::try_from(count).map_err(|_| SaveError::NegativeCount(count))?;

    let body = &bytes[COUNT_LEN..];
    if body.len() < count {
        return Err(SaveError::Truncated { expected: COUNT_LEN + count, found: bytes.len() });
    }
    if body.len() > count {
        return Err(SaveError::TrailingBytes(body.len() - count));
    }

    body.iter()
        .enumerate()
        .map(|(i, b)| {
            MoveDir::from_key(char::from(*b))
                .ok_or(SaveError::BadMove { offset: COUNT_LEN + i, byte: *b })
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Make a player name safe to use as a file stem. A leading `.` would
/// hide the save from listings, so it becomes `_` too.
pub fn sanitize_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_PLAYER.to_string();
    }
    name.chars()
        .enumerate()
        .map(|(i, c)| match c {
            '.' if i == 0 => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn saves_dir(level: &str, kind: SaveKind) -> PathBuf {
    Path::new(GAMES_DIR).join(level).join(kind.dir_name())
}

pub fn save_path(level: &str, kind: SaveKind, player: &str) -> PathBuf {
    saves_dir(level, kind).join(format!("{}.{}", sanitize_name(player), SAVE_EXT))
}

// ══════════════════════════════════════════════════════════════
// Store operations
// ══════════════════════════════════════════════════════════════

pub fn save_moves(
    store: &mut dyn Storage,
    level: &str,
    kind: SaveKind,
    player: &str,
    moves: &MoveSequence,
) -> Result<PathBuf, SaveError> {
    let path = save_path(level, kind, player);
    store.write_all(&path, &encode_moves(moves)).map_err(|e| {
        log::error!("Failed to save game data to {}: {}", path.display(), e);
        e
    })?;
    log::info!("Saved {} moves to {}", moves.len(), path.display());
    Ok(path)
}

pub fn load_moves(
    store: &dyn Storage,
    level: &str,
    kind: SaveKind,
    player: &str,
) -> Result<MoveSequence, SaveError> {
    let path = save_path(level, kind, player);
    let bytes = store.read_all(&path)?;
    decode_moves(&bytes).map_err(|e| {
        log::error!("Failed to load game data from {}: {}", path.display(), e);
        e
    })
}

/// Load an ongoing save and replay it on `level`.
pub fn load_game(
    store: &dyn Storage,
    level: &Level,
    level_name: &str,
    player: &str,
    policy: ReplayPolicy,
) -> Result<Replay, SaveError> {
    log::info!("Loading saved game of '{}' on '{}'", player, level_name);
    let moves = load_moves(store, level_name, SaveKind::Ongoing, player)?;
    Ok(replay(level, &moves, policy)?)
}

pub fn delete_save(
    store: &mut dyn Storage,
    level: &str,
    kind: SaveKind,
    player: &str,
) -> Result<(), SaveError> {
    let path = save_path(level, kind, player);
    store.delete(&path)?;
    log::info!("Deleted {}", path.display());
    Ok(())
}

/// Player names with a save of `kind` for `level`, sorted.
pub fn list_saves(store: &dyn Storage, level: &str, kind: SaveKind) -> Result<Vec<String>, StoreError> {
    let files = match store.list_files(&saves_dir(level, kind)) {
        Ok(f) => f,
        Err(e) if e.is_not_found() => return Ok(vec![]),
        Err(e) => return Err(e),
    };
    let suffix = format!(".{}", SAVE_EXT);
    Ok(files
        .iter()
        .filter_map(|f| f.strip_suffix(suffix.as_str()))
        .map(str::to_string)
        .collect())
}

/// Finished games for `level`, fewest moves first. Unreadable saves are
/// listed last without a count.
pub fn leaderboard(store: &dyn Storage, level: &str) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let mut entries: Vec<LeaderboardEntry> = list_saves(store, level, SaveKind::Finished)?
        .into_iter()
        .map(|player| {
            let moves = load_moves(store, level, SaveKind::Finished, &player)
                .map(|m| m.len())
                .map_err(|e| log::warn!("Leaderboard entry '{}' unreadable: {}", player, e))
                .ok();
            LeaderboardEntry { player, moves }
        })
        .collect();
    entries.sort_by(|a, b| match (a.moves, b.moves) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.player.cmp(&b.player)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.player.cmp(&b.player),
    });
    Ok(entries)
}
