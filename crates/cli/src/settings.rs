//! Launcher configuration
//!
//! Built-in defaults reproduce the demo environment. An optional TOML file
//! replaces them, and command-line / environment overrides win over both.
//!
//! ```toml
//! base_dir = "~/demo"
//! stagger_ms = 2000
//! tick_ms = 1000
//! terminal = "gnome-terminal"
//!
//! [[services]]
//! name = "Next.js"
//! command = "npm run dev"
//! dir = "aws-demo"
//! url = "http://localhost:3001"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stagehand_core::application::supervisor::constants::DEFAULT_TICK_INTERVAL;
use stagehand_core::domain::CommandSpec;
use stagehand_infra_system::TerminalKind;

/// One `[[services]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub command: String,
    /// Relative to `base_dir` unless absolute
    #[serde(default)]
    pub dir: PathBuf,
    pub url: Option<String>,
}

/// Raw file contents, every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_dir: Option<String>,
    pub stagger_ms: Option<u64>,
    pub tick_ms: Option<u64>,
    pub terminal: Option<String>,
    pub services: Vec<ServiceEntry>,
}

impl FileConfig {
    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        settings
            .try_deserialize::<Self>()
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Values supplied on the command line or through `STAGEHAND_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_dir: Option<String>,
    pub stagger_ms: Option<u64>,
    pub tick_ms: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub base_dir: PathBuf,
    pub tick: Duration,
    stagger: Option<Duration>,
    pub terminal: Option<TerminalKind>,
    pub services: Vec<CommandSpec>,
}

impl LauncherConfig {
    /// Load from an optional file and apply overrides
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let cwd = std::env::current_dir().context("Cannot determine current directory")?;
        Self::resolve(file, overrides, &cwd)
    }

    /// Merge file values, overrides and defaults
    pub fn resolve(file: FileConfig, overrides: Overrides, cwd: &Path) -> Result<Self> {
        let base_dir = match overrides.base_dir.or(file.base_dir) {
            Some(raw) => {
                let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
                if expanded.is_absolute() {
                    expanded
                } else {
                    cwd.join(expanded)
                }
            }
            None => cwd.to_path_buf(),
        };

        let terminal = file
            .terminal
            .as_deref()
            .map(str::parse::<TerminalKind>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid terminal in config: {}", e))?;

        let services = if file.services.is_empty() {
            default_services(&base_dir)?
        } else {
            file.services
                .into_iter()
                .map(|entry| {
                    let spec =
                        CommandSpec::new(entry.name, entry.command, base_dir.join(entry.dir))?;
                    Ok(match entry.url {
                        Some(url) => spec.with_url(url),
                        None => spec,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        let tick = match overrides.tick_ms.or(file.tick_ms) {
            Some(0) => anyhow::bail!("tick_ms must be at least 1"),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_TICK_INTERVAL,
        };

        Ok(Self {
            base_dir,
            tick,
            stagger: overrides
                .stagger_ms
                .or(file.stagger_ms)
                .map(Duration::from_millis),
            terminal,
            services,
        })
    }

    /// Configured stagger, or the policy's own default
    pub fn stagger_or(&self, default: Duration) -> Duration {
        self.stagger.unwrap_or(default)
    }
}

/// The demo environment: web front-end, backend dev server, slide deck
pub fn default_services(base_dir: &Path) -> Result<Vec<CommandSpec>> {
    let app_dir = base_dir.join("aws-demo");
    let slides_dir = base_dir.join("slides");

    Ok(vec![
        CommandSpec::new("Next.js", "npm run dev", &app_dir)?.with_url("http://localhost:3001"),
        CommandSpec::new("Convex Backend", "npx convex dev", &app_dir)?,
        CommandSpec::new("Slides", "npx slidev --open", &slides_dir)?
            .with_url("http://localhost:3030"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_without_file() {
        let cfg = assert_ok!(LauncherConfig::resolve(
            FileConfig::default(),
            Overrides::default(),
            Path::new("/work/demo"),
        ));

        assert_eq!(cfg.base_dir, PathBuf::from("/work/demo"));
        assert_eq!(cfg.tick, DEFAULT_TICK_INTERVAL);
        assert_eq!(cfg.stagger_or(Duration::from_secs(2)), Duration::from_secs(2));
        let names: Vec<_> = cfg.services.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Next.js", "Convex Backend", "Slides"]);
        assert_eq!(
            cfg.services[0].working_dir(),
            Path::new("/work/demo/aws-demo")
        );
        assert_eq!(cfg.services[2].working_dir(), Path::new("/work/demo/slides"));
        assert_eq!(cfg.services[2].url(), Some("http://localhost:3030"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = FileConfig {
            base_dir: Some("/from/file".to_string()),
            tick_ms: Some(500),
            stagger_ms: Some(100),
            ..Default::default()
        };
        let overrides = Overrides {
            base_dir: Some("/from/cli".to_string()),
            tick_ms: Some(250),
            stagger_ms: Some(0),
        };

        let cfg = assert_ok!(LauncherConfig::resolve(file, overrides, Path::new("/cwd")));

        assert_eq!(cfg.base_dir, PathBuf::from("/from/cli"));
        assert_eq!(cfg.tick, Duration::from_millis(250));
        assert_eq!(cfg.stagger_or(Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn test_relative_base_dir_joins_cwd() {
        let overrides = Overrides {
            base_dir: Some("demo".to_string()),
            ..Default::default()
        };

        let cfg = assert_ok!(LauncherConfig::resolve(
            FileConfig::default(),
            overrides,
            Path::new("/cwd")
        ));

        assert_eq!(cfg.base_dir, PathBuf::from("/cwd/demo"));
    }

    #[test]
    fn test_file_services_replace_defaults() {
        let file = FileConfig {
            base_dir: Some("/srv".to_string()),
            terminal: Some("xterm".to_string()),
            services: vec![ServiceEntry {
                name: "api".to_string(),
                command: "cargo run".to_string(),
                dir: PathBuf::from("api"),
                url: Some("http://localhost:8080".to_string()),
            }],
            ..Default::default()
        };

        let cfg = assert_ok!(LauncherConfig::resolve(
            file,
            Overrides::default(),
            Path::new("/cwd")
        ));

        assert_eq!(cfg.services.len(), 1);
        assert_eq!(cfg.services[0].working_dir(), Path::new("/srv/api"));
        assert_eq!(cfg.services[0].url(), Some("http://localhost:8080"));
        assert_eq!(cfg.terminal, Some(TerminalKind::Xterm));
    }

    #[test]
    fn test_empty_command_in_file_is_rejected() {
        let file = FileConfig {
            services: vec![ServiceEntry {
                name: "broken".to_string(),
                command: " ".to_string(),
                dir: PathBuf::new(),
                url: None,
            }],
            ..Default::default()
        };

        assert_err!(LauncherConfig::resolve(
            file,
            Overrides::default(),
            Path::new("/cwd")
        ));
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let from_file = FileConfig {
            tick_ms: Some(0),
            ..Default::default()
        };
        let from_cli = Overrides {
            tick_ms: Some(0),
            ..Default::default()
        };

        let err = assert_err!(LauncherConfig::resolve(
            from_file,
            Overrides::default(),
            Path::new("/cwd")
        ));
        assert!(err.to_string().contains("tick_ms"));
        assert_err!(LauncherConfig::resolve(
            FileConfig::default(),
            from_cli,
            Path::new("/cwd")
        ));

        // A valid override wins over a bad file value
        let cfg = assert_ok!(LauncherConfig::resolve(
            FileConfig {
                tick_ms: Some(0),
                ..Default::default()
            },
            Overrides {
                tick_ms: Some(5),
                ..Default::default()
            },
            Path::new("/cwd")
        ));
        assert_eq!(cfg.tick, Duration::from_millis(5));
    }

    #[test]
    fn test_unknown_terminal_is_rejected() {
        let file = FileConfig {
            terminal: Some("tmux".to_string()),
            ..Default::default()
        };

        assert_err!(LauncherConfig::resolve(
            file,
            Overrides::default(),
            Path::new("/cwd")
        ));
    }

    #[test]
    fn test_from_file_toml() {
        let path = std::env::temp_dir()
            .join(format!("stagehand-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
base_dir = "/srv/demo"
tick_ms = 200

[[services]]
name = "web"
command = "npm run dev"
dir = "web"
url = "http://localhost:3001"

[[services]]
name = "worker"
command = "npm run worker"
"#,
        )
        .unwrap();

        let file = assert_ok!(FileConfig::from_file(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(file.base_dir.as_deref(), Some("/srv/demo"));
        assert_eq!(file.tick_ms, Some(200));
        assert_eq!(file.services.len(), 2);
        assert_eq!(file.services[0].url.as_deref(), Some("http://localhost:3001"));
        assert_eq!(file.services[1].dir, PathBuf::new());
    }
}
