//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# guidelint configuration

# Rule preset: "recommended" (default), "strict" or "minimal"
preset = "recommended"

[engine]
# Worker threads (default: available parallelism)
# workers = 8

# Persistent analysis cache; delete the file to start cold
cache = ".guidelint/cache.json"

# Waiver file (SG-900 waivers)
waivers = "guidelint-waivers.toml"

# Flag used waivers that expire within this many days
expiry_lookahead_days = 14

# Cancel the run after this many seconds
# timeout_secs = 600

# Files never analyzed
exclude = [
    "**/node_modules/**",
    "**/.svelte-kit/**",
    "**/build/**",
]

# Per-rule configuration: `enabled`, `severity` ("must", "should", "may")
# and rule options.

# [rules.SG-050]
# patterns = ["$lib/apis", "$lib/apis/**"]
# allow_type_only = true

# [rules.SG-080]
# severity = "should"
# max = 12

# [rules.SG-081]
# max = 3
"#;

/// Writes `guidelint.toml` into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join("guidelint.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit guidelint.toml to configure rules");
    println!("  2. Run your parser to produce *.ast.json sidecars");
    println!("  3. Run: guidelint check");

    Ok(())
}
