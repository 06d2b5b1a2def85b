//! Init command implementation.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "armlint.toml";

const DEFAULT_CONFIG: &str = r#"# armlint configuration

# Rule preset: arm, dataplane or all
preset = "arm"

[linter]
# Kind of API: default, arm, dataplane or rpaas
openapi_type = "arm"

# Glob patterns skipped when discovering specification files
exclude = [
    "**/examples/**",
    "**/node_modules/**",
]

# Run rules in parallel
parallel = true

# Lowest severity that fails the run
fail_on = "error"

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.operation-id-noun-verb]
enabled = true
# allow_noun_in_verb = false

[rules.enum-instead-of-boolean]
severity = "warning"
# allow_names = ["enabled"]

# [rules.resource-collection-get-missing]
# skip_extension_resources = true

# [rules.collection-next-link]
# next_link_name = "nextLink"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = write_config(Path::new("."), force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} to configure rules");
    println!("  2. Run: armlint check specification/");

    Ok(())
}

/// Writes the default configuration into `dir`.
fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}
