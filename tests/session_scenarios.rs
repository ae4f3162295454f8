use std::fs;
use std::path::Path;

use tempfile::TempDir;

use colmatch::engine::{LayoutMode, TokenId};
use colmatch::error::PuzzleError;
use colmatch::session::{Counters, PlacementMode, PuzzleSession, SessionEvent, SessionOptions};
use colmatch::store::session_file::SessionFile;

fn session(mode: PlacementMode, target: usize) -> PuzzleSession {
    let options = SessionOptions {
        target_size: target,
        mode,
        layouts: vec![LayoutMode::Sort, LayoutMode::Shuffle],
    };
    PuzzleSession::with_seed(options, 2024)
}

fn write_list(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn tokens_of(session: &PuzzleSession, entry: &str) -> Vec<TokenId> {
    let board = session.board();
    board
        .entries()
        .find(|(id, _)| board.entry(*id).as_deref() == Some(entry))
        .map(|(_, record)| record.tokens().to_vec())
        .unwrap()
}

fn align(session: &mut PuzzleSession, entry: &str) {
    let tokens = tokens_of(session, entry);
    let y = session.board().token(tokens[0]).unwrap().y();
    for &id in &tokens[1..] {
        session.move_token(id, y);
    }
}

fn sorted_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> = fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

#[test]
fn dog_chien_counters_in_auto_check() {
    let dir = TempDir::new().unwrap();
    let path = write_list(&dir, "fr.tsv", "dog\tchien\ncat\tchat\n");

    let mut s = session(PlacementMode::AutoCheck, 2);
    assert_eq!(s.load(&path).unwrap(), 2);
    s.advance();
    s.drain_events();

    align(&mut s, "dog\tchien");
    let counters: Vec<Counters> = s
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::CountersChanged(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(
        counters.last(),
        Some(&Counters {
            correct: Some(1),
            remaining: 1
        })
    );
    assert_eq!(counters.last().unwrap().correct_or_sentinel(), 1);

    for id in tokens_of(&s, "dog\tchien") {
        assert!(!s.board().token(id).unwrap().can_move());
    }
}

#[test]
fn save_folds_unsolved_entries_back_into_the_list() {
    let dir = TempDir::new().unwrap();
    let path = write_list(&dir, "list.tsv", "a\t1\nb\t2\nc\t3\nd\t4\n");

    let mut s = session(PlacementMode::AutoCheck, 2);
    s.load(&path).unwrap();
    s.advance();
    let on_grid: Vec<String> = s
        .board()
        .entries()
        .filter_map(|(id, _)| s.board().entry(id))
        .collect();
    align(&mut s, &on_grid[0]);

    let out = dir.path().join("out.tsv");
    s.save(&out).unwrap();
    let lines = sorted_lines(&out);
    assert_eq!(lines.len(), 3, "the solved entry is learned: {lines:?}");
    assert!(!lines.contains(&on_grid[0]));
    assert!(lines.contains(&on_grid[1]));

    let mut reloaded = session(PlacementMode::AutoCheck, 2);
    reloaded.load(&out).unwrap();
    assert_eq!(reloaded.bank().len(), 3);
}

#[test]
fn unrevealed_bindings_are_saved_as_unsolved() {
    let dir = TempDir::new().unwrap();
    let path = write_list(&dir, "list.tsv", "a\t1\nb\t2\n");

    let mut s = session(PlacementMode::NoCheck, 2);
    s.load(&path).unwrap();
    s.advance();
    align(&mut s, "a\t1");
    assert_eq!(s.counters().correct, None);

    let out = dir.path().join("out.tsv");
    s.save(&out).unwrap();
    assert_eq!(sorted_lines(&out), vec!["a\t1", "b\t2"]);
}

#[test]
fn malformed_header_empties_the_bank() {
    let dir = TempDir::new().unwrap();
    let good = write_list(&dir, "good.tsv", "a\t1\nb\t2\n");
    let bad = write_list(&dir, "bad.tsv", "no separator here\na\t1\n");

    let mut s = session(PlacementMode::AutoCheck, 5);
    s.load(&good).unwrap();
    assert_eq!(s.bank().len(), 2);

    let err = s.load(&bad).unwrap_err();
    assert!(matches!(err, PuzzleError::Format { .. }));
    assert!(s.bank().is_empty());
}

#[test]
fn missing_file_leaves_the_bank_alone() {
    let dir = TempDir::new().unwrap();
    let good = write_list(&dir, "good.tsv", "a\t1\nb\t2\n");

    let mut s = session(PlacementMode::AutoCheck, 5);
    s.load(&good).unwrap();
    let err = s.load(&dir.path().join("nope.tsv")).unwrap_err();
    assert!(matches!(err, PuzzleError::Io { .. }));
    assert!(err.to_string().contains("nope.tsv"));
    assert_eq!(s.bank().len(), 2);
}

#[test]
fn wider_list_rebuilds_the_board() {
    let dir = TempDir::new().unwrap();
    let two = write_list(&dir, "two.tsv", "a\t1\n");
    let three = write_list(&dir, "three.tsv", "a\t1\tx\nb\t2\n c\t3\ty\tz\n");

    let mut s = session(PlacementMode::AutoCheck, 5);
    s.load(&two).unwrap();
    s.advance();
    assert_eq!(s.grid_size(), 1);

    assert_eq!(s.load(&three).unwrap(), 3);
    assert_eq!(s.board().column_count(), 3);
    assert_eq!(s.grid_size(), 0);
    assert_eq!(s.correct_count(), 0);
    // the short line was skipped
    assert_eq!(s.bank().len(), 2);

    s.advance();
    assert_eq!(s.grid_size(), 2);
    // extra fields are ignored on the board
    assert!(
        s.board()
            .entries()
            .all(|(id, _)| s.board().entry(id).unwrap().split('\t').count() == 3)
    );
}

#[test]
fn grow_and_shrink_follow_the_size_rules() {
    let dir = TempDir::new().unwrap();
    // both columns sorted: no two of these rows ever line up completely
    let path = write_list(&dir, "list.tsv", "a\t3\nb\t2\nc\t1\n");

    let options = SessionOptions {
        target_size: 1,
        mode: PlacementMode::ManualCheck,
        layouts: vec![LayoutMode::Sort],
    };
    let mut s = PuzzleSession::with_seed(options, 7);
    s.load(&path).unwrap();
    s.advance();
    assert_eq!(s.grid_size(), 1);

    s.add_one();
    s.add_one();
    assert_eq!((s.target_size(), s.grid_size(), s.bank().len()), (3, 3, 0));

    s.add_one();
    assert_eq!((s.target_size(), s.grid_size()), (4, 3));

    s.remove_one();
    assert_eq!(s.grid_size(), 2);
    assert_eq!(s.target_size(), 2);
    assert_eq!(s.grid_size() + s.bank().len(), 3);

    s.remove_one();
    s.remove_one();
    assert_eq!(s.grid_size(), 1, "the last entry stays");
}

#[test]
fn three_columns_need_every_field_aligned() {
    let dir = TempDir::new().unwrap();
    let path = write_list(&dir, "es.tsv", "cat\tgato\tel\ncat\tfelino\tel\n");

    let mut s = session(PlacementMode::AutoCheck, 2);
    s.load(&path).unwrap();
    s.advance();

    let first = tokens_of(&s, "cat\tgato\tel");
    let y = s.board().token(first[0]).unwrap().y();
    s.move_token(first[1], y);
    // "el" rows may already line up by chance; only a full row counts
    let bound_rows = s.board().bound_count();
    assert_eq!(s.correct_count(), bound_rows);

    s.move_token(first[2], y);
    assert!(s.correct_count() >= 1);
    let record = s
        .board()
        .bound_records()
        .find(|(_, r)| r.tokens().contains(&first[0]))
        .map(|(_, r)| r.entry(s.board().columns()));
    assert_eq!(record.as_deref(), Some("cat\tgato\tel"));
}

#[test]
fn session_file_round_trip_and_cleanup() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "list.tsv", "a\t1\nb\t2\n");
    let file = SessionFile::with_base_dir(dir.path());

    let mut s = session(PlacementMode::AutoCheck, 2);
    s.load(&list).unwrap();
    s.advance();
    file.persist(&s).unwrap();
    assert_eq!(sorted_lines(file.path()), vec!["a\t1", "b\t2"]);

    align(&mut s, "a\t1");
    align(&mut s, "b\t2");
    assert!(s.is_complete());
    file.persist(&s).unwrap();
    assert!(!file.exists(), "nothing left to learn");
}
