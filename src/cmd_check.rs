//! `check-config` subcommand.

use std::path::Path;

use courier_config::{ConfigLoader, ConfigValidator};

/// Load and validate the configuration, printing every finding.
pub(crate) fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load(path)?;
    let result = ConfigValidator::validate(&config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        return Err(format!("{} has {} error(s)", path.display(), result.errors.len()).into());
    }

    println!("{} is valid", path.display());
    Ok(())
}
