/// Front-end state machine: menus, the running game and the victory flow.
///
/// `App` owns no terminal state. The main loop feeds it [`Action`]s, ticks
/// the victory animation and hands it to the renderer, so every screen
/// transition can be driven from tests against a `MemStorage`.
///
/// ```text
///   MAIN MENU ─ Continue ──▶ LEVEL SELECT ─▶ SAVE SELECT ─▶ Playing
///             ─ New Game ──▶ LEVEL SELECT ─────────────────▶ Playing
///             ─ Leaderboard ▶ LEVEL SELECT ─▶ LEADERBOARD
///   Playing ─ Q ─▶ PAUSED ─ Quit ─▶ QUIT ─ Save and Quit ─▶ name prompt
///   Playing ─ goal ─▶ spiral ─▶ any key ─▶ name prompt ─▶ MAIN MENU
/// ```

use conmaze::domain::entity::{MoveDir, Position};
use conmaze::sim::event::GameEvent;
use conmaze::sim::level::{list_levels, load_level};
use conmaze::sim::replay::ReplayPolicy;
use conmaze::sim::save::{self, SaveKind};
use conmaze::sim::session::{GameSession, SessionError};
use conmaze::sim::step::step;
use conmaze::store::Storage;

use crate::ui::input::{Action, KeyMode};
use crate::ui::sound::Sfx;

/// Longest name accepted at a prompt.
pub const NAME_MAX: usize = 32;

const MAIN_MENU: [&str; 4] = ["Continue", "New Game", "Leaderboard", "Quit"];
const PAUSE_MENU: [&str; 3] = ["Back to game", "Restart", "Quit"];
const QUIT_MENU: [&str; 3] = ["Save and Quit", "Quit", "Cancel"];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Purpose {
    Continue,
    NewGame,
    Leaderboard,
}

impl Purpose {
    fn menu_index(self) -> usize {
        match self {
            Purpose::Continue => 0,
            Purpose::NewGame => 1,
            Purpose::Leaderboard => 2,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PromptFor {
    /// Save and Quit from the pause menu.
    Ongoing,
    /// Leaderboard entry after winning.
    Finished,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu,
    LevelSelect(Purpose),
    SaveSelect,
    Leaderboard,
    Playing,
    Paused,
    QuitMenu,
    /// Spiral running; input is ignored.
    Victory,
    /// Spiral done, waiting for any key.
    VictoryHold,
    NamePrompt(PromptFor),
    Note,
}

impl Phase {
    pub fn key_mode(self) -> KeyMode {
        match self {
            Phase::Playing | Phase::Victory => KeyMode::Game,
            Phase::VictoryHold => KeyMode::AnyKey,
            Phase::NamePrompt(_) => KeyMode::Text,
            _ => KeyMode::Menu,
        }
    }

    /// Title and padding (in `##` pairs) of the framed menu for this phase.
    pub fn menu_title(self) -> Option<(&'static str, usize)> {
        match self {
            Phase::MainMenu => Some(("MAIN MENU", 7)),
            Phase::LevelSelect(_) => Some(("LEVEL SELECT", 8)),
            Phase::SaveSelect => Some(("SAVE SELECT", 8)),
            Phase::Leaderboard => Some(("LEADERBOARD", 10)),
            Phase::Paused => Some(("PAUSED", 7)),
            Phase::QuitMenu => Some(("QUIT", 6)),
            Phase::Note => Some(("NOTE", 9)),
            _ => None,
        }
    }
}

/// Cells of the victory spiral around (`row`, `col`) in a square room of
/// `width`, in drawing order.
///
/// The walk goes up, right, down, left, growing its leg length by one after
/// every right and left leg, until the leg would exceed `2 * width`. Steps
/// outside the room still advance the walk but are not drawn.
pub fn spiral_cells(row: usize, col: usize, width: usize) -> Vec<(usize, usize)> {
    const DIRS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
    let (mut r, mut c) = (row as isize, col as isize);
    let limit = width as isize;
    let mut leg = 1;
    let mut cells = vec![];
    while leg <= 2 * width {
        for (i, (dr, dc)) in DIRS.iter().enumerate() {
            for _ in 0..leg {
                r += dr;
                c += dc;
                if (0..limit).contains(&r) && (0..limit).contains(&c) {
                    cells.push((r as usize, c as usize));
                }
            }
            if i % 2 == 1 {
                leg += 1;
            }
        }
    }
    cells
}

pub struct App {
    store: Box<dyn Storage>,
    policy: ReplayPolicy,
    pub phase: Phase,
    /// Highlighted entry, 0-based.
    pub cursor: usize,
    pub options: Vec<String>,
    levels: Vec<String>,
    level_idx: usize,
    pub session: Option<GameSession>,
    pub level_name: String,
    /// Player whose ongoing save this game was continued from.
    continued_from: Option<String>,
    pub name_input: String,
    pub note: String,
    /// Screen to restore when the note is dismissed.
    note_return: (Phase, usize, Vec<String>),
    pub spiral: Vec<(usize, usize)>,
    pub spiral_shown: usize,
    /// One-line description of the last move's effect.
    pub status: String,
    pub sounds: Vec<Sfx>,
    pub quit: bool,
}

impl App {
    pub fn new(store: Box<dyn Storage>, policy: ReplayPolicy) -> Self {
        App {
            store,
            policy,
            phase: Phase::MainMenu,
            cursor: 0,
            options: menu(&MAIN_MENU),
            levels: vec![],
            level_idx: 0,
            session: None,
            level_name: String::new(),
            continued_from: None,
            name_input: String::new(),
            note: String::new(),
            note_return: (Phase::MainMenu, 0, vec![]),
            spiral: vec![],
            spiral_shown: 0,
            status: String::new(),
            sounds: vec![],
            quit: false,
        }
    }

    pub fn key_mode(&self) -> KeyMode {
        self.phase.key_mode()
    }

    pub fn prompt_label(&self) -> &'static str {
        match self.phase {
            Phase::NamePrompt(PromptFor::Finished) => "Enter your name for the leaderboard: ",
            _ => "Players name: ",
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════════

    pub fn handle(&mut self, action: Action) {
        if action == Action::Interrupt {
            log::info!("Interrupted by user");
            self.quit = true;
            return;
        }
        match self.phase {
            Phase::Playing => self.handle_game(action),
            Phase::Victory => {}
            Phase::VictoryHold => self.open_prompt(PromptFor::Finished),
            Phase::NamePrompt(kind) => self.handle_prompt(kind, action),
            _ => self.handle_menu(action),
        }
    }

    fn handle_menu(&mut self, action: Action) {
        let n = self.options.len().max(1);
        match action {
            Action::Move(MoveDir::Up) => {
                self.cursor = (self.cursor + n - 1) % n;
                self.sounds.push(Sfx::Blip);
            }
            Action::Move(MoveDir::Down) => {
                self.cursor = (self.cursor + 1) % n;
                self.sounds.push(Sfx::Blip);
            }
            Action::Jump(k) => {
                self.cursor = (k + n - 1) % n;
                self.sounds.push(Sfx::Blip);
            }
            Action::Select => self.select(),
            Action::Back => self.back(),
            _ => {}
        }
    }

    fn select(&mut self) {
        match self.phase {
            Phase::MainMenu => match self.cursor {
                0 => self.open_level_select(Purpose::Continue),
                1 => self.open_level_select(Purpose::NewGame),
                2 => self.open_level_select(Purpose::Leaderboard),
                _ => {
                    log::info!("User quit the game");
                    self.quit = true;
                }
            },
            Phase::LevelSelect(purpose) => {
                self.level_idx = self.cursor;
                let Some(level) = self.levels.get(self.level_idx).cloned() else { return };
                match purpose {
                    Purpose::Continue => self.open_save_select(&level),
                    Purpose::NewGame => self.start_game(&level, None),
                    Purpose::Leaderboard => self.open_leaderboard(&level),
                }
            }
            Phase::SaveSelect => {
                let Some(player) = self.options.get(self.cursor).cloned() else { return };
                let level = self.current_level_name();
                self.start_game(&level, Some(player));
            }
            Phase::Leaderboard => self.back(),
            Phase::Paused => match self.cursor {
                0 => self.enter(Phase::Playing, 0),
                1 => {
                    if let Some(s) = self.session.as_mut() {
                        log::info!("Restarting level {}", self.level_name);
                        s.restart();
                    }
                    self.status.clear();
                    self.enter(Phase::Playing, 0);
                }
                _ => self.enter(Phase::QuitMenu, 2),
            },
            Phase::QuitMenu => match self.cursor {
                0 => self.open_prompt(PromptFor::Ongoing),
                1 => {
                    log::info!("Player quit the game through pause menu (no save)");
                    self.end_game();
                    self.enter(Phase::MainMenu, 0);
                }
                _ => self.enter(Phase::Paused, 2),
            },
            Phase::Note => self.close_note(),
            _ => {}
        }
    }

    fn back(&mut self) {
        match self.phase {
            Phase::LevelSelect(purpose) => self.enter(Phase::MainMenu, purpose.menu_index()),
            Phase::SaveSelect => self.enter(Phase::LevelSelect(Purpose::Continue), self.level_idx),
            Phase::Leaderboard => self.enter(Phase::LevelSelect(Purpose::Leaderboard), self.level_idx),
            Phase::Paused => self.enter(Phase::Playing, 0),
            Phase::QuitMenu => self.enter(Phase::Paused, 2),
            Phase::Note => self.close_note(),
            _ => {}
        }
    }

    fn handle_game(&mut self, action: Action) {
        match action {
            Action::Move(dir) => self.play_move(dir),
            Action::Back => self.enter(Phase::Paused, 0),
            _ => {}
        }
    }

    fn play_move(&mut self, dir: MoveDir) {
        let Some(session) = self.session.as_mut() else { return };
        match step(session, dir) {
            Ok(events) => {
                self.sounds.extend(events.iter().filter_map(Sfx::for_event));
                if let Some(msg) = events.iter().rev().find_map(describe) {
                    self.status = msg;
                }
                if session.victory() {
                    let at = session.player();
                    log::info!("Level {} finished in {} moves", self.level_name, session.move_count());
                    self.begin_victory(at);
                }
            }
            Err(e @ SessionError::OffGrid { .. }) => {
                log::error!("{}", e);
                self.status = "There is nothing beyond this edge.".into();
            }
            Err(e) => log::error!("{}", e),
        }
    }

    fn handle_prompt(&mut self, kind: PromptFor, action: Action) {
        match action {
            Action::Type(c) if self.name_input.chars().count() < NAME_MAX => self.name_input.push(c),
            Action::Erase => {
                self.name_input.pop();
            }
            Action::Select => self.submit_name(kind),
            Action::Back => match kind {
                PromptFor::Ongoing => self.enter(Phase::QuitMenu, 0),
                // A win is always recorded.
                PromptFor::Finished => self.submit_name(kind),
            },
            _ => {}
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Victory animation
    // ══════════════════════════════════════════════════════════════

    fn begin_victory(&mut self, at: Position) {
        let width = self.session.as_ref().map_or(0, |s| s.level().room_width);
        self.spiral = spiral_cells(at.row, at.col, width);
        self.spiral_shown = 0;
        self.phase = Phase::Victory;
    }

    /// Reveal one more spiral cell. Returns its ring (distance from the
    /// goal, at least 1), or `None` once the spiral is complete and the app
    /// is waiting for a key.
    pub fn tick(&mut self) -> Option<usize> {
        if self.phase != Phase::Victory {
            return None;
        }
        if self.spiral_shown >= self.spiral.len() {
            self.phase = Phase::VictoryHold;
            return None;
        }
        self.spiral_shown += 1;
        let (r, c) = self.spiral[self.spiral_shown - 1];
        let at = self.session.as_ref().map(|s| s.player());
        let ring = at.map_or(1, |p| p.row.abs_diff(r).max(p.col.abs_diff(c)));
        Some(ring.max(1))
    }

    // ══════════════════════════════════════════════════════════════
    // Screens
    // ══════════════════════════════════════════════════════════════

    fn enter(&mut self, phase: Phase, cursor: usize) {
        self.options = match phase {
            Phase::MainMenu => menu(&MAIN_MENU),
            Phase::Paused => menu(&PAUSE_MENU),
            Phase::QuitMenu => menu(&QUIT_MENU),
            Phase::LevelSelect(_) => self.levels.clone(),
            Phase::Note => vec![self.note.clone()],
            // SaveSelect and Leaderboard fill their options before entering.
            _ => std::mem::take(&mut self.options),
        };
        self.cursor = cursor.min(self.options.len().saturating_sub(1));
        self.phase = phase;
    }

    fn show_note(&mut self, text: &str) {
        let options = std::mem::take(&mut self.options);
        self.note_return = (self.phase, self.cursor, options);
        self.note = text.to_string();
        self.enter(Phase::Note, 0);
    }

    fn close_note(&mut self) {
        let (phase, cursor, options) = std::mem::replace(&mut self.note_return, (Phase::MainMenu, 0, vec![]));
        self.options = options;
        self.cursor = cursor;
        self.phase = phase;
    }

    fn open_level_select(&mut self, purpose: Purpose) {
        self.levels = match list_levels(self.store.as_ref()) {
            Ok(levels) => levels,
            Err(e) => {
                log::error!("Could not list levels: {}", e);
                vec![]
            }
        };
        if self.levels.is_empty() {
            self.show_note("No levels found!");
        } else {
            self.enter(Phase::LevelSelect(purpose), 0);
        }
    }

    fn open_save_select(&mut self, level: &str) {
        let saves = save::list_saves(self.store.as_ref(), level, SaveKind::Ongoing).unwrap_or_else(|e| {
            log::error!("Could not list saves for {}: {}", level, e);
            vec![]
        });
        if saves.is_empty() {
            self.show_note("No ongoing games for this level!");
        } else {
            self.options = saves;
            self.enter(Phase::SaveSelect, 0);
        }
    }

    fn open_leaderboard(&mut self, level: &str) {
        let board = save::leaderboard(self.store.as_ref(), level).unwrap_or_else(|e| {
            log::error!("Could not read leaderboard for {}: {}", level, e);
            vec![]
        });
        if board.is_empty() {
            self.show_note("No finished games for this level!");
        } else {
            self.options = board
                .iter()
                .map(|e| match e.moves {
                    Some(n) => format!("{}: {} moves", e.player, n),
                    None => format!("{}: unreadable", e.player),
                })
                .collect();
            self.enter(Phase::Leaderboard, 0);
        }
    }

    fn open_prompt(&mut self, kind: PromptFor) {
        self.name_input.clear();
        self.phase = Phase::NamePrompt(kind);
    }

    // ══════════════════════════════════════════════════════════════
    // Game lifecycle
    // ══════════════════════════════════════════════════════════════

    fn current_level_name(&self) -> String {
        self.levels.get(self.level_idx).cloned().unwrap_or_default()
    }

    fn start_game(&mut self, level: &str, player: Option<String>) {
        let parsed = match load_level(self.store.as_ref(), level) {
            Ok(p) => p,
            Err(e) => {
                log::error!("{}", e);
                self.show_note(&format!("Level failed to load: {}", e));
                return;
            }
        };
        let session = match &player {
            None => GameSession::new(parsed.level),
            Some(name) => {
                match save::load_game(self.store.as_ref(), &parsed.level, level, name, self.policy) {
                    Ok(replay) => {
                        if !replay.is_clean() {
                            log::warn!(
                                "Save contains invalid moves, it might be old or corrupted ({} skipped)",
                                replay.skipped.len()
                            );
                        }
                        replay.session
                    }
                    Err(e) => {
                        log::error!("Failed to load save of {}: {}", name, e);
                        self.show_note(&format!("Save failed to load: {}", e));
                        return;
                    }
                }
            }
        };
        log::info!("Loaded level {} ({} moves replayed)", level, session.move_count());
        self.level_name = level.to_string();
        self.continued_from = player;
        self.status.clear();
        let won = session.victory();
        let at = session.player();
        self.session = Some(session);
        if won {
            // A save that already reaches the goal goes straight to the win.
            self.begin_victory(at);
        } else {
            self.enter(Phase::Playing, 0);
        }
    }

    fn submit_name(&mut self, kind: PromptFor) {
        let name = save::sanitize_name(&self.name_input);
        let Some(moves) = self.session.as_ref().map(|s| s.moves().clone()) else {
            self.enter(Phase::MainMenu, 0);
            return;
        };
        let level = self.level_name.clone();
        let (save_kind, ok_msg, fail_msg) = match kind {
            PromptFor::Ongoing => (SaveKind::Ongoing, "Game saved successfully!", "Failed to save game."),
            PromptFor::Finished => (SaveKind::Finished, "Score saved to leaderboard!", "Failed to save score."),
        };
        let saved = save::save_moves(self.store.as_mut(), &level, save_kind, &name, &moves).is_ok();

        if !saved && kind == PromptFor::Ongoing {
            // Nothing lost yet: back to the game.
            self.enter(Phase::Playing, 0);
            self.show_note(fail_msg);
            return;
        }
        if saved && kind == PromptFor::Finished {
            if let Some(from) = self.continued_from.take() {
                if let Err(e) = save::delete_save(self.store.as_mut(), &level, SaveKind::Ongoing, &from) {
                    log::warn!("Could not remove finished ongoing save of {}: {}", from, e);
                }
            }
        }

        self.end_game();
        self.enter(Phase::MainMenu, 0);
        self.show_note(if saved { ok_msg } else { fail_msg });
    }

    fn end_game(&mut self) {
        self.session = None;
        self.continued_from = None;
        self.spiral.clear();
        self.spiral_shown = 0;
        self.status.clear();
    }

    #[cfg(test)]
    fn storage(&self) -> &dyn Storage {
        self.store.as_ref()
    }
}

fn menu(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Status line text for an event, if it is worth telling the player.
fn describe(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::KeyCollected { doors: 0, id, .. } => Some(format!("Key {} opens nothing here.", id)),
        GameEvent::KeyCollected { doors, .. } => {
            Some(format!("Key collected, {} door{} opened.", doors, if *doors == 1 { "" } else { "s" }))
        }
        GameEvent::Teleported { to, .. } => Some(format!("Passage to room {}.", to.room)),
        GameEvent::PassageBroken { .. } => Some("This passage leads nowhere.".into()),
        GameEvent::GoalReached { .. } => Some("Goal!".into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conmaze::domain::entity::MoveSequence;
    use conmaze::sim::level::{embedded_levels, level_path};
    use conmaze::sim::save::{encode_moves, load_moves, save_path};
    use conmaze::store::{MemStorage, StoreError};

    const LEVEL: &str = "WIDTH 3\nBEGIN\n###\n@ $\n###\nEND\n";

    fn store_with_level() -> MemStorage {
        MemStorage::new().with_file(level_path("tiny"), LEVEL)
    }

    fn app(store: MemStorage) -> App {
        App::new(Box::new(store), ReplayPolicy::Lenient)
    }

    fn press(app: &mut App, actions: &[Action]) {
        for a in actions {
            app.handle(*a);
        }
    }

    fn finish_spiral(app: &mut App) {
        while app.phase == Phase::Victory {
            app.tick();
        }
    }

    const DOWN: Action = Action::Move(MoveDir::Down);
    const RIGHT: Action = Action::Move(MoveDir::Right);

    #[test]
    fn spiral_starts_above_and_stays_inside() {
        let cells = spiral_cells(1, 1, 3);
        assert_eq!(&cells[..3], &[(0, 1), (0, 2), (1, 2)]);
        assert!(cells.iter().all(|&(r, c)| r < 3 && c < 3));
        // every cell of the 3x3 room except the centre is covered
        for r in 0..3 {
            for c in 0..3 {
                if (r, c) != (1, 1) {
                    assert!(cells.contains(&(r, c)), "({r},{c})");
                }
            }
        }
    }

    #[test]
    fn spiral_in_a_corner_skips_outside_steps() {
        let cells = spiral_cells(0, 0, 2);
        assert_eq!(cells[0], (0, 1));
        assert!(cells.iter().all(|&(r, c)| r < 2 && c < 2));
    }

    #[test]
    fn menu_cursor_wraps_and_jumps() {
        let mut a = app(MemStorage::new());
        a.handle(Action::Move(MoveDir::Up));
        assert_eq!(a.cursor, 3);
        a.handle(DOWN);
        assert_eq!(a.cursor, 0);
        a.handle(Action::Jump(3));
        assert_eq!(a.cursor, 2);
        a.handle(Action::Jump(9));
        assert_eq!(a.cursor, 0);
        a.handle(Action::Jump(0));
        assert_eq!(a.cursor, 3);
    }

    #[test]
    fn no_levels_shows_note_then_returns() {
        let mut a = app(MemStorage::new());
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::Note);
        assert_eq!(a.note, "No levels found!");
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::MainMenu);
    }

    #[test]
    fn continue_without_saves_notes_and_keeps_level_select() {
        let mut a = app(store_with_level());
        press(&mut a, &[Action::Select, Action::Select]);
        assert_eq!(a.note, "No ongoing games for this level!");
        a.handle(Action::Back);
        assert_eq!(a.phase, Phase::LevelSelect(Purpose::Continue));
        a.handle(Action::Back);
        assert_eq!(a.phase, Phase::MainMenu);
        assert_eq!(a.cursor, 0);
    }

    #[test]
    fn win_then_record_score() {
        let mut a = app(store_with_level());
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select]);
        assert_eq!(a.phase, Phase::Playing);
        assert_eq!(a.level_name, "tiny");

        press(&mut a, &[RIGHT, RIGHT]);
        assert_eq!(a.phase, Phase::Victory);
        assert!(a.sounds.contains(&Sfx::Victory));
        a.handle(DOWN);
        assert_eq!(a.phase, Phase::Victory, "input ignored while animating");

        finish_spiral(&mut a);
        assert_eq!(a.phase, Phase::VictoryHold);
        assert_eq!(a.key_mode(), KeyMode::AnyKey);
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::NamePrompt(PromptFor::Finished));

        press(&mut a, &[Action::Type('a'), Action::Type('/'), Action::Type('x'), Action::Erase, Action::Type('b')]);
        assert_eq!(a.name_input, "a/b");
        a.handle(Action::Select);
        assert_eq!(a.note, "Score saved to leaderboard!");
        assert!(a.session.is_none());

        let moves = load_moves(a.storage(), "tiny", SaveKind::Finished, "a_b").unwrap();
        assert_eq!(moves.len(), 2);
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::MainMenu);
    }

    #[test]
    fn save_and_quit_then_continue() {
        let mut a = app(store_with_level());
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select, RIGHT]);
        a.handle(Action::Back);
        assert_eq!(a.phase, Phase::Paused);
        press(&mut a, &[Action::Jump(3), Action::Select]);
        assert_eq!(a.phase, Phase::QuitMenu);
        assert_eq!(a.cursor, 2, "quit menu defaults to Cancel");
        press(&mut a, &[Action::Jump(1), Action::Select]);
        assert_eq!(a.prompt_label(), "Players name: ");
        a.handle(Action::Select);
        assert_eq!(a.note, "Game saved successfully!");
        assert!(a.storage().read_all(&save_path("tiny", SaveKind::Ongoing, "Anonymous")).is_ok());

        press(&mut a, &[Action::Select, Action::Jump(1), Action::Select, Action::Select]);
        assert_eq!(a.phase, Phase::SaveSelect);
        assert_eq!(a.options, vec!["Anonymous".to_string()]);
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::Playing);
        let s = a.session.as_ref().unwrap();
        assert_eq!(s.move_count(), 1);
        assert_eq!(s.player(), Position::new(0, 1, 1));
    }

    #[test]
    fn finishing_a_continued_game_removes_its_ongoing_save() {
        let moves = MoveSequence::from_keys("d").unwrap();
        let store = store_with_level()
            .with_file(save_path("tiny", SaveKind::Ongoing, "ann"), encode_moves(&moves));
        let mut a = app(store);
        press(&mut a, &[Action::Select, Action::Select, Action::Select, RIGHT]);
        finish_spiral(&mut a);
        press(&mut a, &[Action::Select, Action::Type('a'), Action::Select]);
        assert!(a.storage().read_all(&save_path("tiny", SaveKind::Ongoing, "ann")).is_err());
        assert!(a.storage().read_all(&save_path("tiny", SaveKind::Finished, "a")).is_ok());
    }

    /// Storage that can be read but refuses every write.
    struct ReadOnly(MemStorage);

    impl Storage for ReadOnly {
        fn read_all(&self, path: &std::path::Path) -> Result<Vec<u8>, StoreError> {
            self.0.read_all(path)
        }

        fn write_all(&mut self, path: &std::path::Path, _bytes: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn delete(&mut self, path: &std::path::Path) -> Result<(), StoreError> {
            self.0.delete(path)
        }

        fn list_files(&self, dir: &std::path::Path) -> Result<Vec<String>, StoreError> {
            self.0.list_files(dir)
        }
    }

    #[test]
    fn broken_save_is_not_replayed() {
        let store = store_with_level()
            .with_file(save_path("tiny", SaveKind::Ongoing, "x"), vec![5, 0, 0, 0, b'd', b'd', b'd']);
        let mut a = app(store);
        press(&mut a, &[Action::Select, Action::Select]);
        assert_eq!(a.phase, Phase::SaveSelect);
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::Note);
        assert!(a.note.starts_with("Save failed to load"), "{}", a.note);
        assert!(a.session.is_none());
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::SaveSelect);
    }

    #[test]
    fn failed_save_keeps_playing() {
        let mut a = App::new(Box::new(ReadOnly(store_with_level())), ReplayPolicy::Lenient);
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select, RIGHT, Action::Back]);
        press(&mut a, &[Action::Jump(3), Action::Select, Action::Jump(1), Action::Select]);
        assert_eq!(a.phase, Phase::NamePrompt(PromptFor::Ongoing));
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::Note);
        assert_eq!(a.note, "Failed to save game.");
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::Playing);
        assert_eq!(a.session.as_ref().unwrap().move_count(), 1);
    }

    #[test]
    fn failed_score_save_still_ends_the_game() {
        let mut a = App::new(Box::new(ReadOnly(store_with_level())), ReplayPolicy::Lenient);
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select, RIGHT, RIGHT]);
        finish_spiral(&mut a);
        press(&mut a, &[Action::Select, Action::Select]);
        assert_eq!(a.note, "Failed to save score.");
        assert!(a.session.is_none());
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::MainMenu);
    }

    #[test]
    fn restart_resets_session() {
        let mut a = app(store_with_level());
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select, RIGHT, Action::Back]);
        press(&mut a, &[Action::Jump(2), Action::Select]);
        assert_eq!(a.phase, Phase::Playing);
        assert_eq!(a.session.as_ref().unwrap().move_count(), 0);
    }

    #[test]
    fn leaderboard_lists_fewest_moves_first() {
        let mut store = store_with_level();
        for (name, keys) in [("slow", "dadd"), ("fast", "dd")] {
            let moves = MoveSequence::from_keys(keys).unwrap();
            store = store.with_file(save_path("tiny", SaveKind::Finished, name), encode_moves(&moves));
        }
        let mut a = app(store);
        press(&mut a, &[Action::Jump(3), Action::Select, Action::Select]);
        assert_eq!(a.phase, Phase::Leaderboard);
        assert_eq!(a.options, vec!["fast: 2 moves".to_string(), "slow: 4 moves".to_string()]);
        a.handle(Action::Select);
        assert_eq!(a.phase, Phase::LevelSelect(Purpose::Leaderboard));
    }

    #[test]
    fn embedded_levels_are_selectable() {
        let mut store = MemStorage::new();
        for (name, text) in embedded_levels() {
            store = store.with_file(level_path(name), text);
        }
        let mut a = app(store);
        press(&mut a, &[Action::Jump(2), Action::Select]);
        assert_eq!(a.options.len(), embedded_levels().len());
    }

    #[test]
    fn interrupt_quits_from_anywhere() {
        let mut a = app(store_with_level());
        press(&mut a, &[Action::Jump(2), Action::Select, Action::Select]);
        a.handle(Action::Interrupt);
        assert!(a.quit);
    }
}
