use acc_core::config::AccConfig;
use acc_core::error::AccResult;
use colored::*;
use std::path::Path;

/// Print the default configuration, or write it to `output`
pub fn write_default(output: Option<&Path>) -> AccResult<()> {
    let config = AccConfig::uno_default();
    match output {
        Some(path) => {
            config.save(path)?;
            println!("{} Wrote default config to {}", "✓".green(), path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}

/// Load and validate an existing configuration file
pub fn check(path: &Path) -> AccResult<()> {
    let config = AccConfig::load(path)?;
    println!(
        "{} {} is valid (port {}, {} baud)",
        "✓".green(),
        path.display(),
        config.board.port,
        config.board.baud_rate
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_default_passes_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.toml");

        write_default(Some(&path)).unwrap();
        check(&path).unwrap();
        assert_eq!(AccConfig::load(&path).unwrap(), AccConfig::uno_default());
    }

    #[test]
    fn test_check_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[control]\npress_threshold_volts = 9.0\n").unwrap();

        assert!(check(&path).is_err());
    }
}
