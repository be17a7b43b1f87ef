/// Per-cell metadata: the mutable half of a cell.
///
/// Level files and older tools speak in raw integers where `-1` means
/// "no ID / already used" and `-2` means "flagged". Inside the game the
/// value is always one of these variants, so an ID can never be mistaken
/// for a state marker.

use super::tile::Tile;

pub const RAW_SPENT: i32 = -1;
pub const RAW_ERROR: i32 = -2;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Meta {
    /// Tile class carries no ID.
    NoId,
    /// Door opened or key collected.
    Unlocked,
    /// Missing ID or unpaired passage. The tile no longer interacts.
    ErrorState,
    Id(i32),
}

impl Meta {
    /// Interpret an ID token read from a level file for a tile that needs one.
    pub fn from_raw(raw: i32) -> Meta {
        match raw {
            RAW_SPENT => Meta::Unlocked,
            RAW_ERROR => Meta::ErrorState,
            id => Meta::Id(id),
        }
    }

    /// Like [`Meta::from_raw`], except that `-1` only means "opened" or
    /// "collected" for doors and keys. A passage keeps it as an ordinary ID
    /// and pairs with other `-1` passages.
    pub fn for_tile(tile: Tile, raw: i32) -> Meta {
        match (tile, raw) {
            (Tile::Passage, RAW_SPENT) => Meta::Id(RAW_SPENT),
            _ => Meta::from_raw(raw),
        }
    }

    /// Legacy integer view, as shown to renderers and debug output.
    pub fn to_raw(self) -> i32 {
        match self {
            Meta::NoId | Meta::Unlocked => RAW_SPENT,
            Meta::ErrorState => RAW_ERROR,
            Meta::Id(id) => id,
        }
    }

    pub fn is_error(self) -> bool {
        self == Meta::ErrorState
    }

    pub fn is_unlocked(self) -> bool {
        self == Meta::Unlocked
    }
}

impl Default for Meta {
    fn default() -> Self {
        Meta::NoId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sentinels_map_to_tags() {
        assert_eq!(Meta::from_raw(-1), Meta::Unlocked);
        assert_eq!(Meta::from_raw(-2), Meta::ErrorState);
        assert_eq!(Meta::from_raw(0), Meta::Id(0));
        assert_eq!(Meta::from_raw(17), Meta::Id(17));
    }

    #[test]
    fn minus_one_is_an_id_for_passages_only() {
        assert_eq!(Meta::for_tile(Tile::Passage, -1), Meta::Id(-1));
        assert_eq!(Meta::for_tile(Tile::Door, -1), Meta::Unlocked);
        assert_eq!(Meta::for_tile(Tile::Key, -1), Meta::Unlocked);
        assert_eq!(Meta::for_tile(Tile::Passage, -2), Meta::ErrorState);
        assert_eq!(Meta::for_tile(Tile::Passage, 4), Meta::Id(4));
    }

    #[test]
    fn legacy_view_collapses_no_id_and_unlocked() {
        assert_eq!(Meta::NoId.to_raw(), -1);
        assert_eq!(Meta::Unlocked.to_raw(), -1);
        assert_eq!(Meta::ErrorState.to_raw(), -2);
        assert_eq!(Meta::Id(9).to_raw(), 9);
    }
}
