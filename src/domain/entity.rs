/// Player position and movement directions.

/// A cell address: room index, then row and column inside that room.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub room: usize,
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(room: usize, row: usize, col: usize) -> Self {
        Position { room, row, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room {} ({}, {})", self.room, self.row, self.col)
    }
}

/// Movement direction. The recorded form is the WASD key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    pub const ALL: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

    pub fn from_key(c: char) -> Option<MoveDir> {
        match c {
            'w' => Some(MoveDir::Up),
            's' => Some(MoveDir::Down),
            'a' => Some(MoveDir::Left),
            'd' => Some(MoveDir::Right),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            MoveDir::Up    => 'w',
            MoveDir::Down  => 's',
            MoveDir::Left  => 'a',
            MoveDir::Right => 'd',
        }
    }

    /// (row delta, column delta)
    pub fn delta(self) -> (isize, isize) {
        match self {
            MoveDir::Up    => (-1, 0),
            MoveDir::Down  => (1, 0),
            MoveDir::Left  => (0, -1),
            MoveDir::Right => (0, 1),
        }
    }
}

/// The append-only log of accepted moves. Its length is the move count.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MoveSequence {
    moves: Vec<MoveDir>,
}

impl MoveSequence {
    pub fn new() -> Self {
        MoveSequence { moves: Vec::new() }
    }

    pub fn push(&mut self, dir: MoveDir) {
        self.moves.push(dir);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MoveDir> + '_ {
        self.moves.iter().copied()
    }

    /// WASD bytes in acceptance order.
    pub fn to_keys(&self) -> Vec<u8> {
        self.moves.iter().map(|m| m.key() as u8).collect()
    }

    /// Parse a WASD string. Returns the offending character on failure.
    pub fn from_keys(keys: &str) -> Result<Self, char> {
        keys.chars()
            .map(|c| MoveDir::from_key(c).ok_or(c))
            .collect::<Result<Vec<_>, _>>()
            .map(|moves| MoveSequence { moves })
    }
}

impl std::fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for m in &self.moves {
            write!(f, "{}", m.key())?;
        }
        Ok(())
    }
}

impl FromIterator<MoveDir> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = MoveDir>>(iter: I) -> Self {
        MoveSequence { moves: iter.into_iter().collect() }
    }
}
