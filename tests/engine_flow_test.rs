//! End-to-end tests for the progression pipeline
//!
//! Drives `ProgressEngine` through realistic session sequences and checks the
//! properties learners and parents rely on: bounded mastery, counters that
//! never go backwards, one-time badges and approval-gated graduation.

mod common;

use std::collections::BTreeSet;

use semver::Version;
use tinysteps::badges::{evaluate, BadgeCatalog};
use tinysteps::config::Config;
use tinysteps::curriculum::{AgeVariantResolver, CurriculumTable};
use tinysteps::progress::{GraduationStatus, Progress, SessionHistory};
use tinysteps::{EngineError, LearnerState, ProgressEvent};

use common::{activity, at, engine, perfect, quick_config};

#[test]
fn test_perfect_first_session_scenario() {
    let engine = engine(Config::default());
    let mut state = LearnerState::enroll("mia", 5, at(0, 8));

    assert_eq!(state.years.active().unwrap().overall_mastery_percentage, 0.0);

    engine
        .process_session(&mut state, &perfect("counting-order", at(0, 9), 8), at(0, 9))
        .unwrap();

    let year = state.years.active().unwrap();
    assert_eq!(year.mode("counting-order").unwrap().mastery, 100.0);

    let tracked = engine.resolver().tracked_modes(5).len();
    assert_eq!(tracked, 4);
    assert_eq!(year.overall_mastery_percentage, 100.0 / tracked as f64);
    for mode in engine.resolver().tracked_modes(5) {
        assert!(year.mode(mode).is_some(), "{mode} not tracked");
    }
}

#[test]
fn test_mastery_stays_in_bounds() {
    let engine = engine(Config::default());
    let mut state = LearnerState::enroll("leo", 6, at(0, 8));

    let sessions = [
        activity("counting-order", at(0, 9), 0, 10, 1, 0),
        activity("counting-order", at(0, 10), 10, 10, 40, 3),
        activity("puzzle", at(1, 9), 3, 3, 999, 3),
        activity("math-subtraction", at(1, 10), 0, 0, 0, 0),
        activity("math-addition", at(2, 9), 7, 9, 4, 2),
        activity("drawing", at(2, 10), 1, 1, 3, 1),
    ];
    for event in &sessions {
        engine
            .process_session(&mut state, event, event.finished_at)
            .unwrap();

        let year = state.years.active().unwrap();
        assert!((0.0..=100.0).contains(&year.overall_mastery_percentage));
        for (mode, entry) in &year.modes_mastered {
            assert!(
                (0.0..=100.0).contains(&entry.mastery),
                "{mode} mastery {} out of range",
                entry.mastery
            );
        }
    }
}

#[test]
fn test_monotonic_counters_never_decrease() {
    let engine = engine(Config::default());
    let mut state = LearnerState::enroll("ava", 4, at(0, 8));

    let mut counting = activity("counting-order", at(3, 9), 5, 5, 2, 2);
    counting.highest_number = Some(12);
    let mut smaller = activity("counting-order", at(1, 9), 2, 5, 1, 0);
    smaller.highest_number = Some(4);
    let events = [
        counting,
        // Reported late, from an earlier day
        smaller,
        activity("puzzle", at(3, 12), 1, 1, 1, 0),
        activity("puzzle", at(5, 9), 4, 4, 3, 3),
    ];

    let mut previous = Progress::default();
    for event in &events {
        engine
            .process_session(&mut state, event, event.finished_at)
            .unwrap();
        let current = &state.progress;

        assert!(current.total_sessions > previous.total_sessions);
        assert!(current.stars >= previous.stars);
        assert!(current.highest_number_reached >= previous.highest_number_reached);
        assert!(current.best_streak_days >= previous.best_streak_days);
        previous = current.clone();
    }

    assert_eq!(state.progress.highest_number_reached, 12);
    assert_eq!(state.progress.total_sessions, 4);
    assert_eq!(state.progress.stars, 5);
}

#[test]
fn test_star_badge_reported_exactly_once() {
    let catalog = BadgeCatalog::parse(
        r#"
        version = "1.2.0"

        [[badge]]
        id = "fifty_stars"
        name = "Fifty Stars"
        category = "stars"
        criteria = { type = "total_stars", star_target = 50 }

        [[badge]]
        id = "sharp"
        name = "Sharp"
        is_hidden = true
        criteria = { type = "streak", streak_target = 100 }
        "#,
    )
    .unwrap();
    assert_eq!(catalog.version(), &Version::new(1, 2, 0));

    let progress = Progress {
        stars: 50,
        ..Default::default()
    };
    let history = SessionHistory::new();
    let mut earned = BTreeSet::new();

    let first = evaluate(&catalog, &progress, &history, &earned);
    assert_eq!(first, vec!["fifty_stars".to_string()]);

    earned.extend(first);
    assert!(evaluate(&catalog, &progress, &history, &earned).is_empty());
}

#[test]
fn test_engine_never_duplicates_badges() {
    let engine = engine(Config::default());
    let mut state = LearnerState::enroll("sam", 5, at(0, 8));

    for day in 0..8 {
        let event = perfect("puzzle", at(day, 9), 8);
        engine
            .process_session(&mut state, &event, event.finished_at)
            .unwrap();
    }

    let ids: Vec<&str> = state.badges.iter().map(|b| b.badge_id.as_str()).collect();
    let unique: BTreeSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert!(unique.contains("streak_7"));
    assert!(unique.contains("first_puzzle"));
    assert_eq!(
        state.progress.badges_earned,
        unique.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );
}

#[test]
fn test_graduation_requires_approval() {
    let engine = engine(quick_config());
    let mut state = LearnerState::enroll("noa", 3, at(0, 8));

    let plan = [
        perfect("counting-order", at(0, 9), 5),
        perfect("counting-objects", at(1, 9), 4),
        perfect("puzzle", at(2, 9), 5),
    ];
    let mut ready_events = 0;
    for event in &plan {
        let events = engine
            .process_session(&mut state, event, event.finished_at)
            .unwrap();
        ready_events += events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::ReadyForGraduation { age_year: 3, .. }))
            .count();
    }

    assert_eq!(ready_events, 1);
    let year = state.years.active().unwrap();
    assert_eq!(year.graduation_status, GraduationStatus::PendingApproval);
    assert_eq!(year.overall_mastery_percentage, 100.0);
    // Readiness alone never writes history
    assert!(state.years.history().is_empty());

    let record = engine.approve(&mut state, 3, "grandma", at(2, 18)).unwrap();
    assert_eq!((record.from_age, record.to_age), (3, 4));
    assert_eq!(record.summary.total_stars, state.progress.stars);
    assert_eq!(record.summary.modes.len(), 3);

    assert_eq!(state.current_age(), Some(4));
    assert_eq!(
        state.years.year(3).unwrap().graduation_status,
        GraduationStatus::Graduated
    );

    let again = engine.approve(&mut state, 3, "grandma", at(2, 19)).unwrap_err();
    assert!(matches!(again, EngineError::AlreadyGraduated { age: 3 }));
    assert_eq!(state.years.history().len(), 1);
}

#[test]
fn test_rejected_graduation_leaves_no_history() {
    let engine = engine(quick_config());
    let mut state = LearnerState::enroll("eli", 3, at(0, 8));

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

    engine.reject(&mut state, 3).unwrap();
    assert_eq!(
        state.years.active().unwrap().graduation_status,
        GraduationStatus::InProgress
    );
    assert!(state.years.history().is_empty());

    // Still above the floor, so the next session asks again
    let event = perfect("puzzle", at(3, 9), 5);
    let events = engine
        .process_session(&mut state, &event, event.finished_at)
        .unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::ReadyForGraduation { .. })));
    assert!(state.years.history().is_empty());
}

#[test]
fn test_new_year_starts_from_zero() {
    let engine = engine(quick_config());
    let mut state = LearnerState::enroll("ivy", 3, at(0, 8));
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
    engine.approve(&mut state, 3, "dad", at(2, 20)).unwrap();

    // Age-3 sessions do not count towards age 4
    let event = activity("puzzle", at(3, 9), 1, 2, 1, 1);
    engine
        .process_session(&mut state, &event, event.finished_at)
        .unwrap();

    let year = state.years.active().unwrap();
    assert_eq!(year.age_year, 4);
    assert_eq!(year.mode("puzzle").unwrap().sessions, 1);
    assert_eq!(year.mode("counting-order").unwrap().mastery, 0.0);
    assert!(year.overall_mastery_percentage < 50.0);
}

#[test]
fn test_resolver_fallback_never_fails_for_known_modes() {
    let table = CurriculumTable::builtin().unwrap();
    let resolver = AgeVariantResolver::new(table);

    let puzzle = resolver.resolve_or_nearest("puzzle", 4).unwrap();
    assert_eq!(puzzle.age, 3);
    assert!(matches!(
        resolver.resolve("puzzle", 4),
        Err(EngineError::ConfigNotFound { .. })
    ));

    for mode in table.modes() {
        for age in 0..=12 {
            assert!(resolver.resolve_or_nearest(mode, age).is_ok(), "{mode} at {age}");
        }
    }
}

#[test]
fn test_builtin_difficulty_never_decreases_with_age() {
    let table = CurriculumTable::builtin().unwrap();
    assert!(table.violations().is_empty());

    for mode in table.modes() {
        let levels: Vec<u8> = table
            .bands(mode)
            .unwrap()
            .values()
            .map(|v| v.difficulty_level)
            .collect();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]), "{mode}: {levels:?}");
    }
}
