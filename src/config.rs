use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dal::OrphanPolicy;
use crate::model::DEFAULT_SERVICE_URL;

#[derive(Parser, Debug)]
#[command(name = "instapexport")]
#[command(about = "Merges Instapaper exports into bookmarks, highlights and pages", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config", global = true)]
    pub config_path: Option<String>,

    /// Emit logs as json lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every page with its highlights
    Pages(PagesArgs),
    /// Print page counts and the most highlighted pages
    Summary(SummaryArgs),
    /// Serve the merged exports over http
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Export files or directories of exports, merged in the given order
    pub inputs: Vec<PathBuf>,

    /// Skip highlights whose bookmark is in none of the exports
    #[arg(long)]
    pub drop_orphans: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PagesArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(long, default_value_t = crate::report::DEFAULT_TOP)]
    pub top: usize,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(short, long)]
    pub port: Option<u16>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".instapexport")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default)]
    export_dir: Option<String>,
    #[serde(default = "default_service_url")]
    service_url: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub drop_orphans: bool,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for App {
    fn default() -> Self {
        App {
            export_dir: None,
            service_url: default_service_url(),
            port: default_port(),
            drop_orphans: false,
        }
    }
}

impl App {
    pub fn get_export_dir(&self) -> Option<PathBuf> {
        self.export_dir.as_deref().filter(|d| !d.is_empty()).map(expand_home)
    }

    pub fn get_service_url(&self) -> &str {
        &self.service_url
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        if self.drop_orphans {
            OrphanPolicy::Drop
        } else {
            OrphanPolicy::Fail
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Loads `path` when given, otherwise the default config file if there is one.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Config::new(path),
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    Config::new(&default_path.to_string_lossy())
                } else {
                    tracing::debug!(path = ?default_path, "no config file, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path))?;
        Config::from_yaml(&yaml_str).with_context(|| format!("failed to parse config {}", path))
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => Path::new(dir).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_app_missing() {
        let cfg = Config::from_yaml("{}").unwrap();
        assert_eq!(cfg.app.get_service_url(), "https://instapaper.com");
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.get_export_dir(), None);
        assert_eq!(cfg.app.orphan_policy(), OrphanPolicy::Fail);
    }

    #[test]
    fn test_env_default_substitution() {
        let yaml = "app:\n  export_dir: ${INSTAPEXPORT_TEST_UNSET_DIR:-/data/instapaper}\n  drop_orphans: true\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_export_dir(), Some(PathBuf::from("/data/instapaper")));
        assert_eq!(cfg.app.orphan_policy(), OrphanPolicy::Drop);
    }

    #[test]
    fn test_home_expansion() {
        let cfg = Config::from_yaml("app:\n  export_dir: ~/exports\n").unwrap();
        let dir = cfg.app.get_export_dir().unwrap();
        assert!(dir.ends_with("exports"));
        assert!(!dir.starts_with("~"));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(Config::load_or_default(Some(&path.to_string_lossy())).is_err());
    }
}
