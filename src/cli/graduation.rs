//! Graduation commands: approve and reject

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use tinysteps::config::Config;
use tinysteps::engine::{LearnerState, ProgressEngine};
use tinysteps::store::ProgressStore;

use super::learner::load_learner;

fn target_age(state: &LearnerState, age: Option<u8>) -> Result<u8> {
    match age {
        Some(age) => Ok(age),
        None => state
            .current_age()
            .context("Learner has no active age-year; pass --age explicitly"),
    }
}

/// Approve a pending graduation
pub fn approve_command(
    config: Config,
    db: &Path,
    user_id: &str,
    age: Option<u8>,
    approved_by: &str,
) -> Result<()> {
    let engine = ProgressEngine::from_config(config)?;
    let store = ProgressStore::open(db)?;
    let mut state = load_learner(&store, user_id)?;
    let age = target_age(&state, age)?;

    let now = Utc::now();
    let record = engine.approve(&mut state, age, approved_by, now)?;
    store.save_learner(&state, now)?;

    println!(
        "{} graduated from age {} to {} ({:.1}% mastery, {} stars)",
        user_id,
        record.from_age,
        record.to_age,
        record.summary.overall_mastery_percentage,
        record.summary.total_stars
    );
    Ok(())
}

/// Decline a pending graduation
pub fn reject_command(config: Config, db: &Path, user_id: &str, age: Option<u8>) -> Result<()> {
    let engine = ProgressEngine::from_config(config)?;
    let store = ProgressStore::open(db)?;
    let mut state = load_learner(&store, user_id)?;
    let age = target_age(&state, age)?;

    engine.reject(&mut state, age)?;
    store.save_learner(&state, Utc::now())?;
    println!("Graduation from age {} declined; {} keeps practicing", age, user_id);
    Ok(())
}
