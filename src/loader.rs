//! Load orchestration.
//!
//! A [`Loader`] finds configuration files, decodes each one onto the target
//! in order, then resolves every field against the environment and the
//! field annotations.

use crate::coerce::{Coercer, TimeLayout};
use crate::decode::{DecodeContext, Table, decode_table};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::Error;
use crate::flatten::{Section, Walker};
use crate::resolve::Resolver;
use crate::source::decode_file;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Filename searched for by default.
pub const DEFAULT_FILENAME: &str = "config.yaml";
/// Second filename searched for by default, applied after the first.
pub const DEFAULT_SECONDARY_FILENAME: &str = "secret.yaml";
/// Directory searched by default.
pub const DEFAULT_DIR: &str = ".";
/// Annotation key for alternate names.
pub const DEFAULT_TAG: &str = "config";

/// Configures and runs a load.
///
/// ```no_run
/// use layercfg::{Config, Loader};
///
/// #[derive(Debug, Default, Config)]
/// struct AppConfig {
///     #[config(default = "info")]
///     log_level: String,
///     #[config(required)]
///     database_url: String,
/// }
///
/// let mut cfg = AppConfig::default();
/// Loader::new()
///     .file("config.toml")
///     .dirs([".", "/etc/myapp"])
///     .use_env("myapp")
///     .load(&mut cfg)?;
/// # Ok::<(), layercfg::Error>(())
/// ```
#[derive(Clone)]
pub struct Loader {
    filenames: Vec<String>,
    dirs: Vec<PathBuf>,
    tag: String,
    coercer: Coercer,
    env_prefix: Option<String>,
    env_source: Arc<dyn EnvSource>,
    strict: bool,
    ignore_file: bool,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            filenames: vec![
                DEFAULT_FILENAME.to_string(),
                DEFAULT_SECONDARY_FILENAME.to_string(),
            ],
            dirs: vec![PathBuf::from(DEFAULT_DIR)],
            tag: DEFAULT_TAG.to_string(),
            coercer: Coercer::default(),
            env_prefix: None,
            env_source: Arc::new(ProcessEnv),
            strict: false,
            ignore_file: false,
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("filenames", &self.filenames)
            .field("dirs", &self.dirs)
            .field("tag", &self.tag)
            .field("time_layout", self.coercer.layout())
            .field("env_prefix", &self.env_prefix)
            .field("strict", &self.strict)
            .field("ignore_file", &self.ignore_file)
            .finish()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate filename, searched after the ones already configured.
    ///
    /// The extension selects the format: `yaml`, `yml`, `json` or `toml`.
    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.filenames.push(name.into());
        self
    }

    /// Replace the search directories. Earlier directories take precedence.
    pub fn dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Also search the platform configuration directory for `app`,
    /// e.g. `~/.config/app` on Linux.
    pub fn app_dirs(mut self, app: &str) -> Self {
        if let Some(dir) = dirs::config_dir() {
            self.dirs.push(dir.join(app));
        }
        self
    }

    /// Skip file loading entirely. Requires [`use_env`](Self::use_env).
    pub fn ignore_file(mut self) -> Self {
        self.ignore_file = true;
        self
    }

    /// Annotation key used to pick alternate field names.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Layout used for timestamps in files, environment and defaults.
    pub fn time_layout(mut self, layout: TimeLayout) -> Self {
        self.coercer = Coercer::new(layout);
        self
    }

    /// Overlay environment variables named `PREFIX_FIELD_PATH`.
    ///
    /// An empty prefix uses the bare `FIELD_PATH`.
    pub fn use_env(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Read environment variables from `source` instead of the process.
    pub fn env_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.env_source = Arc::new(source);
        self
    }

    /// Fail when a file contains keys the target does not declare.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn tag_key(&self) -> &str {
        &self.tag
    }

    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Existing files to load, in filename order. For each filename only the
    /// first directory containing it counts.
    pub fn find_files(&self) -> Vec<PathBuf> {
        self.filenames
            .iter()
            .filter_map(|name| {
                self.dirs
                    .iter()
                    .map(|dir| dir.join(name))
                    .find(|path| path.is_file())
            })
            .collect()
    }

    /// Populate `target` from files, then the environment, then annotations.
    pub fn load<T: Section>(&self, target: &mut T) -> Result<(), Error> {
        let use_env = self.env_prefix.is_some();
        if self.ignore_file && !use_env {
            return Err(Error::InvalidSources);
        }

        if !self.ignore_file {
            let paths = self.find_files();
            if paths.is_empty() && !use_env {
                return Err(Error::FileNotFound {
                    names: self.filenames.clone(),
                });
            }
            for path in &paths {
                self.apply_file(target, path)?;
            }
        }

        self.resolve(target)
    }

    /// Apply already-decoded tables in order, then resolve.
    pub fn load_values<T, I>(&self, target: &mut T, tables: I) -> Result<(), Error>
    where
        T: Section,
        I: IntoIterator<Item = Table>,
    {
        let cx = self.decode_context();
        for table in tables {
            decode_table(target, &table, &cx)?;
        }
        self.resolve(target)
    }

    fn apply_file<T: Section>(&self, target: &mut T, path: &Path) -> Result<(), Error> {
        let table = decode_file(path)?;
        debug!(path = %path.display(), keys = table.len(), "applying config file");
        decode_table(target, &table, &self.decode_context())?;
        Ok(())
    }

    fn decode_context(&self) -> DecodeContext<'_> {
        DecodeContext::new(&self.tag, &self.coercer).strict(self.strict)
    }

    fn resolve<T: Section>(&self, target: &mut T) -> Result<(), Error> {
        let walker = Walker::new(&self.tag);
        let fields = target.fields(&walker);
        debug!(fields = fields.len(), "resolving fields");
        let mut resolver = Resolver::new(&self.coercer);
        if let Some(prefix) = &self.env_prefix {
            resolver = resolver.with_env(prefix, self.env_source.as_ref());
        }
        resolver.resolve(fields)?;
        Ok(())
    }
}

/// Load `target` with the default settings: `config.yaml` then `secret.yaml`
/// from the working directory, no environment overlay.
pub fn load<T: Section>(target: &mut T) -> Result<(), Error> {
    Loader::default().load(target)
}
