//! Saving, loading and replaying games through a real data directory.

use conmaze::domain::entity::{MoveSequence, Position};
use conmaze::domain::meta::Meta;
use conmaze::sim::level::{install_embedded_levels, list_levels, load_level};
use conmaze::sim::replay::{replay, ReplayPolicy};
use conmaze::sim::save::{
    self, decode_moves, leaderboard, list_saves, load_game, load_moves, save_moves, SaveError, SaveKind,
};
use conmaze::sim::session::GameSession;
use conmaze::sim::step::step;
use conmaze::store::{FsStorage, Storage};

fn data_dir() -> (tempfile::TempDir, FsStorage) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FsStorage::new(tmp.path());
    (tmp, store)
}

fn play(session: &mut GameSession, keys: &str) {
    for dir in MoveSequence::from_keys(keys).unwrap().iter() {
        step(session, dir).unwrap();
    }
}

#[test]
fn bundled_levels_install_once() {
    let (_tmp, mut store) = data_dir();
    assert_eq!(install_embedded_levels(&mut store).unwrap(), 2);
    assert_eq!(install_embedded_levels(&mut store).unwrap(), 0);
    assert_eq!(list_levels(&store).unwrap(), vec!["01-first-steps", "02-two-rooms"]);
}

#[test]
fn ongoing_save_resumes_where_it_left_off() {
    let (_tmp, mut store) = data_dir();
    install_embedded_levels(&mut store).unwrap();
    let level = load_level(&store, "02-two-rooms").unwrap().level;

    // Through the passage, pick up the key, come back.
    let mut live = GameSession::new(level.clone());
    play(&mut live, "ddssww");
    assert_eq!(live.player(), Position::new(0, 1, 3));
    assert_eq!(live.meta_at(Position::new(0, 3, 3)), Meta::Unlocked);

    save_moves(&mut store, "02-two-rooms", SaveKind::Ongoing, "Ann", live.moves()).unwrap();
    assert_eq!(list_saves(&store, "02-two-rooms", SaveKind::Ongoing).unwrap(), vec!["Ann"]);

    let resumed = load_game(&store, &level, "02-two-rooms", "Ann", ReplayPolicy::Strict).unwrap();
    assert!(resumed.is_clean());
    assert_eq!(resumed.session.player(), live.player());
    assert_eq!(resumed.session.meta(), live.meta());
    assert_eq!(resumed.session.moves(), live.moves());

    let mut session = resumed.session;
    play(&mut session, "ssss");
    assert!(session.victory());
    assert_eq!(session.move_count(), 10);
}

#[test]
fn finished_games_rank_on_the_leaderboard() {
    let (_tmp, mut store) = data_dir();
    install_embedded_levels(&mut store).unwrap();
    let level = load_level(&store, "01-first-steps").unwrap().level;

    for (player, keys) in [("wanderer", "dddsdaasss"), ("direct", "dddsasss")] {
        let mut s = GameSession::new(level.clone());
        play(&mut s, keys);
        assert!(s.victory(), "{player}");
        save_moves(&mut store, "01-first-steps", SaveKind::Finished, player, s.moves()).unwrap();
    }
    let board = leaderboard(&store, "01-first-steps").unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.player.as_str()).collect();
    assert_eq!(names, vec!["direct", "wanderer"]);
    assert!(board[0].moves < board[1].moves);
}

#[test]
fn deleted_save_disappears_from_listing() {
    let (_tmp, mut store) = data_dir();
    let moves = MoveSequence::from_keys("d").unwrap();
    save_moves(&mut store, "x", SaveKind::Ongoing, "a/b", &moves).unwrap();
    assert_eq!(list_saves(&store, "x", SaveKind::Ongoing).unwrap(), vec!["a_b"]);
    save::delete_save(&mut store, "x", SaveKind::Ongoing, "a_b").unwrap();
    assert!(list_saves(&store, "x", SaveKind::Ongoing).unwrap().is_empty());
}

#[test]
fn truncated_save_is_rejected() {
    let (_tmp, mut store) = data_dir();
    let mut bytes = 5i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(b"sds");
    store.write_all(&save::save_path("lvl", SaveKind::Ongoing, "p"), &bytes).unwrap();

    let err = load_moves(&store, "lvl", SaveKind::Ongoing, "p").unwrap_err();
    assert!(matches!(err, SaveError::Truncated { expected: 9, found: 7 }), "{err:?}");
}

#[test]
fn stale_save_skips_what_no_longer_fits() {
    let (_tmp, mut store) = data_dir();
    install_embedded_levels(&mut store).unwrap();
    let level = load_level(&store, "01-first-steps").unwrap().level;

    // 'w' from the start walks into the top wall.
    let moves = decode_moves(&{
        let mut b = 3i32.to_le_bytes().to_vec();
        b.extend_from_slice(b"wdd");
        b
    })
    .unwrap();
    let lenient = replay(&level, &moves, ReplayPolicy::Lenient).unwrap();
    assert_eq!(lenient.skipped, vec![0]);
    assert_eq!(lenient.session.moves().to_string(), "dd");
    assert!(replay(&level, &moves, ReplayPolicy::Strict).is_err());
}
