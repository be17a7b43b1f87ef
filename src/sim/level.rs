/// Level parser and loader.
///
/// ## Sources (priority order):
///   1. `levels/` inside the data directory (`<name>.dat` files)
///   2. Built-in embedded levels, installed into `levels/` when it is empty
///
/// ## Level format (`.dat`):
///   ```text
///   ; comment lines start with ';'
///   WIDTH 7
///   BEGIN
///   #######
///   #@ ^  #  1
///   ...
///   END
///   ```
///
/// The width line may also be a bare integer. Between `BEGIN` and `END`,
/// every `WIDTH` consecutive data lines form one square room. The first
/// `WIDTH` characters of a line are tiles; whatever follows is a list of
/// integer IDs handed out, row-major, to that room's doors, keys and
/// passages.
///
/// ## Tile legend:
///   '#' = Wall       '&' = Door        '!' = Key
///   ' ' = Void       '^' = Passage     '@' = Start
///   '$' = Goal       anything else = decorative text

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entity::Position;
use crate::domain::map::Level;
use crate::domain::meta::Meta;
use crate::domain::tile::Tile;
use crate::store::{Storage, StoreError};

pub const LEVELS_DIR: &str = "levels";
pub const LEVEL_EXT: &str = "dat";

/// Rooms wider than this still load but will not fit most terminals.
pub const MAX_COMFORTABLE_WIDTH: usize = 32;

// ══════════════════════════════════════════════════════════════
// Errors and warnings
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing or invalid WIDTH declaration")]
    MissingWidth,
    #[error("no room data between BEGIN and END")]
    EmptyRoomData,
    #[error("{lines} data lines cannot fill one room of width {width}")]
    NoRooms { lines: usize, width: usize },
    #[error("no start tile '@' found")]
    NoStart,
    #[error("{count} start tiles '@' found, expected exactly one")]
    MultipleStart { count: usize },
}

/// Problems the parser works around. Each one is logged as it is found.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("room width {width} is larger than {}", MAX_COMFORTABLE_WIDTH)]
    WideRooms { width: usize },
    #[error("{dropped} trailing data lines do not fill a room of width {width}, ignored")]
    TruncatedLines { width: usize, dropped: usize },
    #[error("row {row} of room {room} is short, padded with walls")]
    ShortLine { room: usize, row: usize },
    #[error("room {room}: metadata token {token:?} is not an integer, skipped")]
    BadMetadataToken { room: usize, token: String },
    #[error("room {room}: {unused} metadata values left unused")]
    ExcessMetadata { room: usize, unused: usize },
    #[error("missing metadata for '{tile}' at {pos}, tile disabled")]
    MissingMetadata { tile: char, pos: Position },
    #[error("no goal tile '$' found")]
    NoGoalTile,
}

impl ParseWarning {
    fn log(&self) {
        match self {
            ParseWarning::MissingMetadata { .. } => log::error!("{}", self),
            _ => log::warn!("{}", self),
        }
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("level {name:?}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

/// A parsed level plus everything the parser had to work around.
#[derive(Clone, Debug)]
pub struct ParsedLevel {
    pub level: Level,
    pub warnings: Vec<ParseWarning>,
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse level text. Pure apart from logging: the same text always yields
/// the same level and warnings.
pub fn parse_level(text: &str) -> Result<ParsedLevel, ParseError> {
    let mut warnings = vec![];
    let mut lines = text.lines();

    let width = scan_width(&mut lines).ok_or(ParseError::MissingWidth)?;
    if width > MAX_COMFORTABLE_WIDTH {
        warn(&mut warnings, ParseWarning::WideRooms { width });
    }

    let data = collect_room_lines(&mut lines);
    if data.is_empty() {
        return Err(ParseError::EmptyRoomData);
    }

    let room_count = data.len() / width;
    let leftover = data.len() % width;
    if room_count == 0 {
        return Err(ParseError::NoRooms { lines: data.len(), width });
    }
    if leftover > 0 {
        warn(&mut warnings, ParseWarning::TruncatedLines { width, dropped: leftover });
    }

    let cells = room_count * width * width;
    let mut tiles = Vec::with_capacity(cells);
    let mut meta = Vec::with_capacity(cells);
    let mut starts = vec![];
    let mut goals = 0usize;

    for room in 0..room_count {
        let rows = &data[room * width..(room + 1) * width];
        let mut ids = vec![];

        for (row, line) in rows.iter().enumerate() {
            let mut chars = line.chars();
            let mut short = false;
            for _ in 0..width {
                match chars.next() {
                    Some(c) => tiles.push(Tile::from_char(c)),
                    None => {
                        tiles.push(Tile::Wall);
                        short = true;
                    }
                }
            }
            if short {
                warn(&mut warnings, ParseWarning::ShortLine { room, row });
            }

            for token in chars.as_str().split_whitespace() {
                match token.parse::<i32>() {
                    Ok(n) => ids.push(n),
                    Err(_) => warn(&mut warnings, ParseWarning::BadMetadataToken {
                        room,
                        token: token.to_string(),
                    }),
                }
            }
        }

        let base = room * width * width;
        let mut next_id = ids.iter();
        for (i, tile) in tiles[base..].iter().enumerate() {
            let pos = Position::new(room, i / width, i % width);
            match tile {
                Tile::Start => starts.push(pos),
                Tile::Goal => goals += 1,
                _ => {}
            }
            if !tile.needs_id() {
                meta.push(Meta::NoId);
                continue;
            }
            match next_id.next() {
                Some(raw) => meta.push(Meta::for_tile(*tile, *raw)),
                None => {
                    meta.push(Meta::ErrorState);
                    warn(&mut warnings, ParseWarning::MissingMetadata { tile: tile.to_char(), pos });
                }
            }
        }
        let unused = next_id.count();
        if unused > 0 {
            warn(&mut warnings, ParseWarning::ExcessMetadata { room, unused });
        }
    }

    let start = match starts.as_slice() {
        [] => return Err(ParseError::NoStart),
        [only] => *only,
        many => return Err(ParseError::MultipleStart { count: many.len() }),
    };
    if goals == 0 {
        warn(&mut warnings, ParseWarning::NoGoalTile);
    }

    log::info!("Loaded level: WIDTH={}, ROOM_COUNT={}", width, room_count);
    Ok(ParsedLevel {
        level: Level::from_parts(width, room_count, tiles, meta, start),
        warnings,
    })
}

fn warn(warnings: &mut Vec<ParseWarning>, w: ParseWarning) {
    w.log();
    warnings.push(w);
}

/// Consume lines up to and including the width declaration.
/// Lines that are neither comments nor numbers are skipped.
fn scan_width<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<usize> {
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let value = match line.strip_prefix("WIDTH") {
            Some(rest) => leading_int(rest.trim_start()).unwrap_or(0),
            None => match leading_int(line) {
                Some(n) => n,
                None => continue,
            },
        };
        return usize::try_from(value).ok().filter(|w| *w > 0);
    }
    None
}

/// Raw data lines between `BEGIN` and `END`. A missing `END` runs to the
/// end of the text.
fn collect_room_lines<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut in_rooms = false;
    let mut data = vec![];
    for line in lines {
        let marker = line.trim();
        if marker.starts_with(';') {
            continue;
        }
        if !in_rooms {
            in_rooms = marker == "BEGIN";
            continue;
        }
        if marker == "END" {
            break;
        }
        if marker.is_empty() {
            continue;
        }
        data.push(line);
    }
    data
}

/// Optional sign followed by digits at the start of `s`; trailing text is
/// ignored.
fn leading_int(s: &str) -> Option<i64> {
    let digits_from = usize::from(s.starts_with(['+', '-']));
    let end = s[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + digits_from);
    if end == digits_from {
        return None;
    }
    s[..end].parse().ok()
}

// ══════════════════════════════════════════════════════════════
// Loading from storage
// ══════════════════════════════════════════════════════════════

pub fn level_path(name: &str) -> PathBuf {
    Path::new(LEVELS_DIR).join(format!("{}.{}", name, LEVEL_EXT))
}

/// Names of the available levels (file stem of every `.dat` in `levels/`).
/// A missing directory is an empty list.
pub fn list_levels(store: &dyn Storage) -> Result<Vec<String>, StoreError> {
    let files = match store.list_files(Path::new(LEVELS_DIR)) {
        Ok(f) => f,
        Err(e) if e.is_not_found() => return Ok(vec![]),
        Err(e) => return Err(e),
    };
    let suffix = format!(".{}", LEVEL_EXT);
    Ok(files
        .iter()
        .filter_map(|f| f.strip_suffix(suffix.as_str()))
        .map(str::to_string)
        .collect())
}

pub fn load_level(store: &dyn Storage, name: &str) -> Result<ParsedLevel, LevelError> {
    let bytes = store.read_all(&level_path(name))?;
    let text = String::from_utf8_lossy(&bytes);
    log::info!("Loading level '{}'", name);
    parse_level(&text).map_err(|source| {
        log::error!("Level '{}' rejected: {}", name, source);
        LevelError::Parse { name: name.to_string(), source }
    })
}

/// Write the built-in levels into an empty `levels/` directory.
/// Returns how many were installed.
pub fn install_embedded_levels(store: &mut dyn Storage) -> Result<usize, StoreError> {
    if !list_levels(store)?.is_empty() {
        return Ok(0);
    }
    let levels = embedded_levels();
    for (name, text) in &levels {
        store.write_all(&level_path(name), text.as_bytes())?;
    }
    log::info!("Installed {} built-in levels", levels.len());
    Ok(levels.len())
}

/// Built-in levels as `(name, text)`.
pub fn embedded_levels() -> Vec<(&'static str, &'static str)> {
    vec![
        ("01-first-steps", FIRST_STEPS),
        ("02-two-rooms", TWO_ROOMS),
    ]
}

const FIRST_STEPS: &str = "\
; One room, one key, one door.
WIDTH 8
BEGIN
########
#@  !  #  1
#      #
###&####  1
#      #
#  $   #
#      #
########
END
";

const TWO_ROOMS: &str = "\
; The key is behind a passage; come back the same way.
WIDTH 7
BEGIN
#######
#@ ^  #  1
#     #
###&###  2
#     #
#  $  #
#######
#######
#  ^  #  1
#     #
#  !  #  2
#     #
#     #
#######
END
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStorage;

    fn level_text(width: &str, rows: &[&str]) -> String {
        let mut s = format!("{}\nBEGIN\n", width);
        for r in rows {
            s.push_str(r);
            s.push('\n');
        }
        s.push_str("END\n");
        s
    }

    // ── Width ──

    #[test]
    fn width_accepts_keyword_or_bare_number() {
        let rows = ["#@#", "# #", "#$#"];
        assert_eq!(parse_level(&level_text("WIDTH 3", &rows)).unwrap().level.room_width, 3);
        assert_eq!(parse_level(&level_text("  3", &rows)).unwrap().level.room_width, 3);
    }

    #[test]
    fn width_skips_comments_and_junk() {
        let text = "; title\n\nhello\nWIDTH 3\nBEGIN\n#@#\n# #\n#$#\nEND\n";
        assert_eq!(parse_level(text).unwrap().level.room_count, 1);
    }

    #[test]
    fn missing_or_zero_width_is_fatal() {
        assert_eq!(parse_level("BEGIN\nEND\n").unwrap_err(), ParseError::MissingWidth);
        assert_eq!(parse_level(&level_text("WIDTH 0", &["@"])).unwrap_err(), ParseError::MissingWidth);
        assert_eq!(parse_level(&level_text("-4", &["@"])).unwrap_err(), ParseError::MissingWidth);
        assert_eq!(parse_level(&level_text("WIDTH x", &["@"])).unwrap_err(), ParseError::MissingWidth);
    }

    #[test]
    fn wide_rooms_only_warn() {
        let row = format!("@{}", " ".repeat(MAX_COMFORTABLE_WIDTH));
        let blank = "#".repeat(MAX_COMFORTABLE_WIDTH + 1);
        let mut rows = vec![row.as_str()];
        rows.extend(std::iter::repeat(blank.as_str()).take(MAX_COMFORTABLE_WIDTH));
        let parsed = parse_level(&level_text("WIDTH 33", &rows)).unwrap();
        assert!(parsed.warnings.contains(&ParseWarning::WideRooms { width: 33 }));
    }

    // ── Room data ──

    #[test]
    fn empty_block_is_fatal() {
        assert_eq!(parse_level("WIDTH 3\nBEGIN\n; nothing\n\nEND\n").unwrap_err(), ParseError::EmptyRoomData);
        assert_eq!(parse_level("WIDTH 3\n").unwrap_err(), ParseError::EmptyRoomData);
    }

    #[test]
    fn too_few_lines_for_a_room_is_fatal() {
        let err = parse_level(&level_text("WIDTH 3", &["#@#", "#$#"])).unwrap_err();
        assert_eq!(err, ParseError::NoRooms { lines: 2, width: 3 });
    }

    #[test]
    fn leftover_lines_are_dropped_with_warning() {
        let parsed = parse_level(&level_text("WIDTH 2", &["@$", "##", "#"])).unwrap();
        assert_eq!(parsed.level.room_count, 1);
        assert!(parsed.warnings.contains(&ParseWarning::TruncatedLines { width: 2, dropped: 1 }));
    }

    #[test]
    fn short_lines_pad_with_walls() {
        let parsed = parse_level(&level_text("WIDTH 3", &["@$", " # ", "#"])).unwrap();
        let room = parsed.level.room_tiles(0);
        assert_eq!(room[2], Tile::Wall);
        assert_eq!(&room[6..9], &[Tile::Wall, Tile::Wall, Tile::Wall]);
        assert!(parsed.warnings.contains(&ParseWarning::ShortLine { room: 0, row: 0 }));
        assert!(parsed.warnings.contains(&ParseWarning::ShortLine { room: 0, row: 2 }));
    }

    #[test]
    fn leading_voids_survive() {
        let parsed = parse_level(&level_text("WIDTH 3", &["  @", " $ ", "  #"])).unwrap();
        assert_eq!(parsed.level.start, Position::new(0, 0, 2));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn comments_inside_block_are_skipped() {
        let text = "WIDTH 2\nBEGIN\n@$\n; note\n##\nEND\n##\n";
        let parsed = parse_level(text).unwrap();
        assert_eq!(parsed.level.room_count, 1);
        assert!(parsed.warnings.is_empty());
    }

    // ── Metadata ──

    #[test]
    fn ids_assigned_row_major_within_room() {
        let parsed = parse_level(&level_text("WIDTH 3", &[
            "#@#  5",
            "!&^  6 7",
            "#$#  8",
        ])).unwrap();
        let meta = parsed.level.initial_meta();
        assert_eq!(meta[3], Meta::Id(5));
        assert_eq!(meta[4], Meta::Id(6));
        assert_eq!(meta[5], Meta::Id(7));
        assert!(parsed.warnings.contains(&ParseWarning::ExcessMetadata { room: 0, unused: 1 }));
    }

    #[test]
    fn ids_do_not_leak_between_rooms() {
        let parsed = parse_level(&level_text("WIDTH 2", &[
            "@! 3 4",
            "$ ",
            "& ",
            "##",
        ])).unwrap();
        let meta = parsed.level.initial_meta();
        assert_eq!(meta[1], Meta::Id(3));
        assert_eq!(meta[4], Meta::ErrorState);
        assert!(parsed.warnings.contains(&ParseWarning::ExcessMetadata { room: 0, unused: 1 }));
        assert!(parsed.warnings.contains(&ParseWarning::MissingMetadata {
            tile: '&',
            pos: Position::new(1, 0, 0),
        }));
    }

    #[test]
    fn sentinel_ids_map_to_states() {
        let parsed = parse_level(&level_text("WIDTH 3", &["@!& -1 -2", "^$  9", "###"])).unwrap();
        let meta = parsed.level.initial_meta();
        assert_eq!(meta[1], Meta::Unlocked);
        assert_eq!(meta[2], Meta::ErrorState);
        assert_eq!(meta[3], Meta::Id(9));
    }

    #[test]
    fn bad_tokens_are_skipped() {
        let parsed = parse_level(&level_text("WIDTH 3", &["@! x 4", "$  ", "###"])).unwrap();
        assert_eq!(parsed.level.initial_meta()[1], Meta::Id(4));
        assert!(parsed.warnings.contains(&ParseWarning::BadMetadataToken {
            room: 0,
            token: "x".to_string(),
        }));
    }

    #[test]
    fn plain_tiles_get_no_id() {
        let parsed = parse_level(&level_text("WIDTH 2", &["@$", "#a"])).unwrap();
        assert!(parsed.level.initial_meta().iter().all(|m| *m == Meta::NoId));
        assert_eq!(parsed.level.tile_at(Position::new(0, 1, 1)), Tile::Text('a'));
    }

    // ── Start / goal ──

    #[test]
    fn start_count_must_be_one() {
        assert_eq!(parse_level(&level_text("WIDTH 2", &["$ ", "##"])).unwrap_err(), ParseError::NoStart);
        assert_eq!(
            parse_level(&level_text("WIDTH 2", &["@$", "@@"])).unwrap_err(),
            ParseError::MultipleStart { count: 3 },
        );
    }

    #[test]
    fn start_found_in_later_room() {
        let parsed = parse_level(&level_text("WIDTH 2", &["$ ", "##", " @", "##"])).unwrap();
        assert_eq!(parsed.level.start, Position::new(1, 0, 1));
    }

    #[test]
    fn missing_goal_only_warns() {
        let parsed = parse_level(&level_text("WIDTH 2", &["@ ", "##"])).unwrap();
        assert_eq!(parsed.warnings, vec![ParseWarning::NoGoalTile]);
    }

    #[test]
    fn parsing_is_repeatable() {
        let text = TWO_ROOMS;
        let a = parse_level(text).unwrap();
        let b = parse_level(text).unwrap();
        assert_eq!(a.level, b.level);
        assert_eq!(a.warnings, b.warnings);
    }

    // ── Storage ──

    #[test]
    fn embedded_levels_parse_cleanly() {
        for (name, text) in embedded_levels() {
            let parsed = parse_level(text).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(parsed.warnings.is_empty(), "{name}: {:?}", parsed.warnings);
        }
    }

    #[test]
    fn list_levels_strips_extension_and_ignores_others() {
        let store = MemStorage::new()
            .with_file("levels/b.dat", "")
            .with_file("levels/a.dat", "")
            .with_file("levels/readme.txt", "");
        assert_eq!(list_levels(&store).unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(list_levels(&MemStorage::new()).unwrap().is_empty());
    }

    #[test]
    fn install_only_into_empty_dir() {
        let mut store = MemStorage::new();
        assert_eq!(install_embedded_levels(&mut store).unwrap(), embedded_levels().len());
        assert_eq!(install_embedded_levels(&mut store).unwrap(), 0);
        let parsed = load_level(&store, "02-two-rooms").unwrap();
        assert_eq!(parsed.level.room_count, 2);
    }

    #[test]
    fn load_reports_missing_and_broken_levels() {
        let store = MemStorage::new().with_file("levels/bad.dat", "WIDTH 2\nBEGIN\n$ \n##\nEND\n");
        assert!(matches!(load_level(&store, "nope"), Err(LevelError::Store(e)) if e.is_not_found()));
        assert!(matches!(
            load_level(&store, "bad"),
            Err(LevelError::Parse { source: ParseError::NoStart, .. }),
        ));
    }
}
