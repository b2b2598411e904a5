pub mod config;
pub mod extract;
pub mod predict;
pub mod prepare;
pub mod train;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use smartdoc_core::SmartdocConfig;

/// Load and validate configuration: the explicit `--config` file, else the
/// user config file if one exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SmartdocConfig> {
    let config = match config_path {
        Some(path) => SmartdocConfig::from_file(Path::new(path))?,
        None => {
            let default = config::default_config_path();
            if default.exists() {
                debug!("Using config from {}", default.display());
                SmartdocConfig::from_file(&default)?
            } else {
                SmartdocConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Expand a glob pattern into the `.txt` files it matches, sorted.
pub fn expand_text_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching .txt files found for pattern: {}", pattern);
    }
    Ok(files)
}

pub fn progress_bar(len: usize, unit: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit}"
            ))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
