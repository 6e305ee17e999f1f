//! Resolve command implementation

use anyhow::Result;

use tinysteps::config::Config;
use tinysteps::engine::ProgressEngine;

/// Print the variant config a screen would get for `mode` at `age`
pub fn resolve_command(config: Config, mode: &str, age: u8, exact: bool) -> Result<()> {
    let engine = ProgressEngine::from_config(config)?;
    let resolver = engine.resolver();

    let variant = if exact {
        resolver.resolve(mode, age)?
    } else {
        resolver.resolve_or_nearest(mode, age)?
    };

    if variant.age != age {
        println!("# no band for age {}, using age {}", age, variant.age);
    }
    println!("{}", serde_json::to_string_pretty(variant)?);
    Ok(())
}
