//! Validate command implementation

use anyhow::Result;

use tinysteps::config::Config;
use tinysteps::engine::ProgressEngine;

/// Load both catalogs and report what was found.
///
/// Any cycle, dangling reference or table invariant violation is returned as
/// an error so the process exits non-zero.
pub fn validate_command(config: Config) -> Result<()> {
    let engine = ProgressEngine::from_config(config)?;
    let badges = engine.badge_catalog();
    let table = engine.resolver().table();

    println!("Badge catalog v{}: {} badges", badges.version(), badges.len());
    let hidden = badges.badges().iter().filter(|b| b.is_hidden).count();
    if hidden > 0 {
        println!("  ({} hidden)", hidden);
    }

    println!("Curriculum v{}:", table.version());
    for mode in table.modes() {
        let ages: Vec<String> = table
            .bands(mode)
            .map(|bands| bands.keys().map(|a| a.to_string()).collect())
            .unwrap_or_default();
        println!("  {:<18} ages {}", mode, ages.join(", "));
    }

    println!("OK");
    Ok(())
}
