//! Learner commands: enroll, record and status

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use tinysteps::config::Config;
use tinysteps::engine::{LearnerState, ProgressEngine, ProgressEvent};
use tinysteps::progress::ActivityEvent;
use tinysteps::store::ProgressStore;

/// Load a learner or fail with a readable message
pub fn load_learner(store: &ProgressStore, user_id: &str) -> Result<LearnerState> {
    store
        .load_learner(user_id)?
        .with_context(|| format!("Unknown learner '{}' (use `tinysteps enroll`)", user_id))
}

/// Create a learner at an age-year
pub fn enroll_command(db: &Path, user_id: &str, age: u8) -> Result<()> {
    let store = ProgressStore::open(db)?;
    let state = store.create_learner(user_id, age, Utc::now())?;
    println!(
        "Enrolled {} at age {}",
        state.user_id,
        state.current_age().unwrap_or(age)
    );
    Ok(())
}

/// Apply an `ActivityEvent` JSON file to a learner and print the resulting events
pub fn record_command(config: Config, db: &Path, user_id: &str, session: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(session)
        .with_context(|| format!("Failed to read session file: {}", session.display()))?;
    let event: ActivityEvent = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse session file: {}", session.display()))?;

    let engine = ProgressEngine::from_config(config)?;
    let store = ProgressStore::open(db)?;
    let mut state = load_learner(&store, user_id)?;

    let now = Utc::now();
    let events = engine.process_session(&mut state, &event, now)?;
    store.save_learner(&state, now)?;

    for event in &events {
        match event {
            ProgressEvent::SessionRecorded { session_id, mode } => {
                println!("Recorded {} session {}", mode, session_id);
            }
            ProgressEvent::StreakExtended { days } => {
                println!("Streak: {} days in a row!", days);
            }
            ProgressEvent::MasteryUpdated {
                mode,
                previous,
                current,
            } => {
                println!("Mastery {}: {:.1}% -> {:.1}%", mode, previous, current);
            }
            ProgressEvent::BadgeEarned(badge) => {
                let name = engine
                    .badge_catalog()
                    .get(&badge.badge_id)
                    .map(|b| b.name.as_str())
                    .unwrap_or(badge.badge_id.as_str());
                println!("New badge: {}", name);
            }
            ProgressEvent::ReadyForGraduation {
                age_year,
                overall_mastery,
            } => {
                println!(
                    "Ready to graduate from age {} ({:.1}% mastery), waiting for approval",
                    age_year, overall_mastery
                );
            }
        }
    }
    Ok(())
}

/// Print progress, mastery, badges and graduation status
pub fn status_command(config: Config, db: &Path, user_id: &str) -> Result<()> {
    let engine = ProgressEngine::from_config(config)?;
    let store = ProgressStore::open(db)?;
    let state = load_learner(&store, user_id)?;
    let progress = &state.progress;
    let now = Utc::now();
    let streak = progress.streak();
    let streak_state = if streak.is_active(now.date_naive()) {
        "active"
    } else {
        "ended"
    };

    println!("Learner {}\n", state.user_id);
    println!(
        "  Sessions: {} ({:.0} min)  Stars: {}  Streak: {} {} (best {})",
        progress.total_sessions,
        progress.total_time_minutes,
        progress.stars,
        streak.current,
        streak_state,
        streak.best
    );

    match state.years.active() {
        Some(year) => {
            println!(
                "\n  Age {}: {} - {:.1}% overall",
                year.age_year,
                year.graduation_status.label(),
                year.overall_mastery_percentage
            );
            for (mode, entry) in &year.modes_mastered {
                println!(
                    "    {:<18} {:>5.1}%  level {}  ({} sessions)",
                    mode, entry.mastery, entry.level, entry.sessions
                );
            }
            for requirement in engine.requirements(&state, now)? {
                let mark = if requirement.met { "x" } else { " " };
                println!("    [{}] {} ({})", mark, requirement.id, requirement.detail);
            }
        }
        None => println!("\n  All age-years graduated"),
    }

    let catalog = engine.badge_catalog();
    println!("\n  Badges ({}/{}):", state.badges.len(), catalog.len());
    for badge in &state.badges {
        let name = catalog
            .get(&badge.badge_id)
            .map(|b| b.name.as_str())
            .unwrap_or(badge.badge_id.as_str());
        println!("    {} ({})", name, badge.earned_at.format("%Y-%m-%d"));
    }

    if !state.years.history().is_empty() {
        println!("\n  Graduations:");
        for record in state.years.history() {
            println!(
                "    {} -> {} on {} by {}",
                record.from_age,
                record.to_age,
                record.graduated_at.format("%Y-%m-%d"),
                record.approved_by
            );
        }
    }
    Ok(())
}
