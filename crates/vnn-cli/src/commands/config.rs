//! Configuration commands.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::CliResult;

/// Dump the effective configuration to stdout.
pub fn dump(config: &PipelineConfig, path: &Path) -> CliResult<()> {
    let toml_str = config.to_toml()?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &PipelineConfig) -> CliResult<()> {
    config.validate()?;

    for source in &config.sources {
        println!("  {:<28} {}", source.name(), source.kind());
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    let exists = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("config: {}{}", path.display(), exists);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::CliError;

    #[test]
    fn validate_rejects_bad_config() {
        let config = PipelineConfig {
            allowed_states: vec![],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Invalid(_))));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn validate_accepts_defaults() {
        validate(&PipelineConfig::default()).unwrap();
    }

    #[test]
    fn dump_default() {
        dump(&PipelineConfig::default(), &PipelineConfig::default_path()).unwrap();
    }
}
