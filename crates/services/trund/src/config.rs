//! Service configuration.
//!
//! Everything is read from environment variables. [`Config::from_lookup`]
//! takes the variable source as a closure so the parsing can be exercised
//! without touching the process environment.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use trun_io::runner::Runner;

use crate::prelude::*;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WORK_ROOT: &str = "./temp";
pub const DEFAULT_CLONE_CMD: &str = "git clone -- {source} {workdir}";
pub const DEFAULT_INSTALL_CMD: &str = "npm ci";
pub const DEFAULT_TEST_CMD: &str = "npm test -- --ci=false";

/// Replaced by the source link when a template is rendered.
pub const SOURCE_PLACEHOLDER: &str = "{source}";
/// Replaced by the run's working directory when a template is rendered.
pub const WORKDIR_PLACEHOLDER: &str = "{workdir}";

/// A command line with `{source}` and `{workdir}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
        }
    }

    /// Splits a command line on whitespace. The first word is the program.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(String::from);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Builds a runner with every placeholder substituted.
    pub fn render(&self, source: &str, workdir: &Path) -> Runner {
        let workdir = workdir.display().to_string();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(SOURCE_PLACEHOLDER, source)
                    .replace(WORKDIR_PLACEHOLDER, &workdir)
            })
            .collect();
        Runner::new(self.program.clone(), args)
    }
}

/// What the orchestrator runs and where.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory of every run's working directory.
    pub work_root: PathBuf,
    pub clone_cmd: CommandTemplate,
    pub install_cmd: CommandTemplate,
    pub test_cmd: CommandTemplate,
    /// Upper bound for each step. `None` waits forever.
    pub step_timeout: Option<Duration>,
}

/// Top level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration from `lookup`. Unset and blank variables fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|err| Error::InvalidConfig {
                    var: "PORT",
                    reason: err.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        let step_timeout = match get("TRUN_STEP_TIMEOUT_SECS") {
            Some(secs) => {
                let secs = secs
                    .trim()
                    .parse::<u64>()
                    .map_err(|err| Error::InvalidConfig {
                        var: "TRUN_STEP_TIMEOUT_SECS",
                        reason: err.to_string(),
                    })?;
                if secs == 0 {
                    return Err(Error::InvalidConfig {
                        var: "TRUN_STEP_TIMEOUT_SECS",
                        reason: String::from("must be greater than zero"),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let template = |var: &'static str, default: &'static str| -> Result<CommandTemplate> {
            let line = get(var).unwrap_or_else(|| default.to_string());
            CommandTemplate::parse(&line).ok_or(Error::InvalidConfig {
                var,
                reason: String::from("command is empty"),
            })
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            pipeline: PipelineConfig {
                work_root: get("TRUN_WORK_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_ROOT)),
                clone_cmd: template("TRUN_CLONE_CMD", DEFAULT_CLONE_CMD)?,
                install_cmd: template("TRUN_INSTALL_CMD", DEFAULT_INSTALL_CMD)?,
                test_cmd: template("TRUN_TEST_CMD", DEFAULT_TEST_CMD)?,
                step_timeout,
            },
        })
    }

    /// Address the API listens on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
