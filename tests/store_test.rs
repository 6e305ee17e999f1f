//! Persistence tests: learner snapshots survive a save/load cycle and the
//! graduation audit trail is never duplicated.

mod common;

use tinysteps::progress::GraduationStatus;

use common::{at, engine, perfect, quick_config, temp_store};

#[test]
fn test_snapshot_roundtrip_after_sessions() {
    let (_dir, store) = temp_store();
    let engine = engine(quick_config());
    let mut state = store.create_learner("zoe", 5, at(0, 8)).unwrap();

    for day in 0..3 {
        let event = perfect("counting-order", at(day, 9), 4);
        engine
            .process_session(&mut state, &event, event.finished_at)
            .unwrap();
        store.save_learner(&state, event.finished_at).unwrap();
    }

    let loaded = store.load_learner("zoe").unwrap().unwrap();
    assert_eq!(loaded.progress, state.progress);
    assert_eq!(loaded.sessions.records(), state.sessions.records());
    assert_eq!(loaded.years, state.years);
    assert_eq!(loaded.completions, state.completions);
    assert_eq!(loaded.badges.len(), state.badges.len());
}

#[test]
fn test_pruned_sessions_are_dropped_from_disk() {
    let (_dir, store) = temp_store();
    let mut config = quick_config();
    config.history.max_sessions = 2;
    let engine = engine(config);
    let mut state = store.create_learner("max", 4, at(0, 8)).unwrap();

    for hour in 9..14 {
        let event = perfect("puzzle", at(0, hour), 1);
        engine
            .process_session(&mut state, &event, event.finished_at)
            .unwrap();
    }
    store.save_learner(&state, at(0, 14)).unwrap();

    let loaded = store.load_learner("max").unwrap().unwrap();
    assert_eq!(loaded.sessions.len(), 2);
    assert_eq!(loaded.sessions.last().unwrap().date, at(0, 13));
    // The aggregate still counts every session
    assert_eq!(loaded.progress.total_sessions, 5);
}

#[test]
fn test_graduation_history_written_once() {
    let (_dir, store) = temp_store();
    let engine = engine(quick_config());
    let mut state = store.create_learner("kai", 3, at(0, 8)).unwrap();

    for (day, mode, level) in [
        (0, "counting-order", 5),
        (1, "counting-objects", 4),
        (2, "puzzle", 5),
    ] {
        let event = perfect(mode, at(day, 9), level);
        engine
            .process_session(&mut state, &event, event.finished_at)
            .unwrap();
    }
    engine.approve(&mut state, 3, "teacher", at(2, 15)).unwrap();

    store.save_learner(&state, at(2, 15)).unwrap();
    store.save_learner(&state, at(2, 16)).unwrap();
    assert_eq!(store.graduation_count("kai").unwrap(), 1);

    let loaded = store.load_learner("kai").unwrap().unwrap();
    assert_eq!(loaded.current_age(), Some(4));
    assert_eq!(
        loaded.years.year(3).unwrap().graduation_status,
        GraduationStatus::Graduated
    );
    assert_eq!(loaded.years.history(), state.years.history());
}

#[test]
fn test_unknown_learner() {
    let (_dir, store) = temp_store();
    assert!(store.load_learner("ghost").unwrap().is_none());
    assert!(!store.learner_exists("ghost").unwrap());
}
