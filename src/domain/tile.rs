/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// ## Legend
///   '#' = Wall      (impassable)
///   '&' = Door      (impassable until unlocked, needs ID)
///   '!' = Key       (unlocks doors with the same ID, needs ID)
///   ' ' = Void      (passable)
///   '^' = Passage   (teleports to the passage sharing its ID, needs ID)
///   '@' = Start     (player spawn, passable)
///   '$' = Goal      (victory on entry)
///   anything else = Text (display only, passable)

pub const CHAR_WALL: char = '#';
pub const CHAR_DOOR: char = '&';
pub const CHAR_KEY: char = '!';
pub const CHAR_VOID: char = ' ';
pub const CHAR_PASSAGE: char = '^';
pub const CHAR_START: char = '@';
pub const CHAR_GOAL: char = '$';

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tile {
    Wall,
    Door,
    Key,
    Void,
    Passage,
    Start,
    Goal,
    Text(char),
}

impl Tile {
    pub fn from_char(c: char) -> Tile {
        match c {
            CHAR_WALL    => Tile::Wall,
            CHAR_DOOR    => Tile::Door,
            CHAR_KEY     => Tile::Key,
            CHAR_VOID    => Tile::Void,
            CHAR_PASSAGE => Tile::Passage,
            CHAR_START   => Tile::Start,
            CHAR_GOAL    => Tile::Goal,
            other        => Tile::Text(other),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Tile::Wall    => CHAR_WALL,
            Tile::Door    => CHAR_DOOR,
            Tile::Key     => CHAR_KEY,
            Tile::Void    => CHAR_VOID,
            Tile::Passage => CHAR_PASSAGE,
            Tile::Start   => CHAR_START,
            Tile::Goal    => CHAR_GOAL,
            Tile::Text(c) => c,
        }
    }

    /// Does this tile consume an ID from the room's metadata list?
    pub fn needs_id(self) -> bool {
        matches!(self, Tile::Door | Tile::Key | Tile::Passage)
    }

    /// Walls never let the player in; doors depend on metadata.
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn is_door(self) -> bool {
        matches!(self, Tile::Door)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Wall
    }
}
