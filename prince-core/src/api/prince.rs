//! Fluent builder for prince(1) invocations.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::config::{OneOrMany, PrinceConfig, PrinceOptions};
use super::error::{ExecuteError, PrinceError};
use super::exec::{run, Rendered};
use super::options::{OptionRegistry, OptionValue, RASTER_OUTPUT};
use crate::env;
use crate::paths;

/// Builder and runner for one prince(1) command line.
///
/// ```ignore
/// let rendered = Prince::new()
///     .inputs("doc.html")
///     .output("doc.pdf")
///     .option_value("media", "print")?
///     .execute()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Prince {
    config: PrinceConfig,
    registry: &'static OptionRegistry,
}

impl Default for Prince {
    fn default() -> Self {
        Self::new()
    }
}

impl Prince {
    /// Creates a builder, picking up a distribution unpacked by the
    /// provisioner in the default package directory.
    pub fn new() -> Self {
        Self::discover_in(&paths::package_dir())
    }

    /// Creates a builder, picking up a distribution unpacked under
    /// `package_dir`.
    pub fn discover_in(package_dir: &Path) -> Self {
        let mut prince = Self::from_config(PrinceConfig::default());
        if let Some((binary, prefix)) = paths::find_installed(package_dir) {
            debug!("Found bundled prince(1) at {}", binary.display());
            prince
                .binary(binary.to_string_lossy())
                .prefix(prefix.to_string_lossy());
        }
        prince
    }

    /// Creates a builder from [`Prince::new`] and applies caller overrides.
    pub fn with_options(options: PrinceOptions) -> Self {
        let mut prince = Self::new();
        prince.apply(options);
        prince
    }

    /// Wraps an existing configuration without probing the filesystem.
    ///
    /// `config.options` are taken as given, as if each had been set with
    /// `forced`; the registry only checks options added afterwards.
    pub fn from_config(config: PrinceConfig) -> Self {
        Self {
            config,
            registry: OptionRegistry::current(),
        }
    }

    /// Validates options against another release's table.
    pub fn with_registry(mut self, registry: &'static OptionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Applies construction-time overrides through the setters.
    pub fn apply(&mut self, options: PrinceOptions) -> &mut Self {
        if let Some(binary) = options.binary {
            self.binary(binary);
        }
        if let Some(prefix) = options.prefix {
            self.prefix(prefix);
        }
        if let Some(license) = options.license {
            self.license(license);
        }
        if let Some(timeout_ms) = options.timeout_ms {
            self.timeout(timeout_ms);
        }
        if let Some(max_buffer) = options.max_buffer {
            self.max_buffer(max_buffer);
        }
        if let Some(cwd) = options.cwd {
            self.cwd(cwd);
        }
        if let Some(inputs) = options.inputs {
            self.inputs(inputs);
        }
        if let Some(cookies) = options.cookies {
            self.cookies(cookies);
        }
        if let Some(output) = options.output {
            self.output(output);
        }
        self
    }

    pub fn config(&self) -> &PrinceConfig {
        &self.config
    }

    pub fn registry(&self) -> &'static OptionRegistry {
        self.registry
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Sets the binary and clears `prefix`.
    ///
    /// The reverse does not hold: `prefix` leaves `binary` alone.
    pub fn binary(&mut self, binary: impl Into<String>) -> &mut Self {
        self.config.binary = binary.into();
        self.config.prefix.clear();
        self
    }

    pub fn prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn license(&mut self, license: impl Into<String>) -> &mut Self {
        self.config.license = license.into();
        self
    }

    /// Sets the child-process timeout in milliseconds; 0 disables it.
    pub fn timeout(&mut self, timeout_ms: u64) -> &mut Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn max_buffer(&mut self, bytes: usize) -> &mut Self {
        self.config.max_buffer = bytes;
        self
    }

    pub fn cwd(&mut self, cwd: impl Into<String>) -> &mut Self {
        self.config.cwd = cwd.into();
        self
    }

    /// Replaces the input list. A single path becomes a one-element list.
    pub fn inputs(&mut self, inputs: impl Into<OneOrMany>) -> &mut Self {
        self.config.inputs = inputs.into().into_vec();
        self
    }

    /// Replaces the cookie list. A single cookie becomes a one-element list.
    pub fn cookies(&mut self, cookies: impl Into<OneOrMany>) -> &mut Self {
        self.config.cookies = cookies.into().into_vec();
        self
    }

    pub fn output(&mut self, output: impl Into<String>) -> &mut Self {
        self.config.output = output.into();
        self
    }

    /// Sets a prince(1) option.
    ///
    /// `value` of `None` stores a bare flag. Unless `forced`, the name must
    /// be in the registry and value-taking options need a value.
    pub fn option(
        &mut self,
        name: &str,
        value: Option<OptionValue>,
        forced: bool,
    ) -> Result<&mut Self, PrinceError> {
        if !forced {
            match self.registry.lookup(name) {
                None => return Err(PrinceError::InvalidOption(name.to_string())),
                Some(true) if value.is_none() => {
                    return Err(PrinceError::MissingArgument(name.to_string()))
                }
                Some(_) => {}
            }
        }

        let value = value.unwrap_or(OptionValue::Bool(true));
        // IndexMap::insert keeps the original position of an existing key
        self.config.options.insert(name.to_string(), value);
        Ok(self)
    }

    /// Sets a boolean switch.
    pub fn flag(&mut self, name: &str) -> Result<&mut Self, PrinceError> {
        self.option(name, None, false)
    }

    /// Sets an option with a value.
    pub fn option_value(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> Result<&mut Self, PrinceError> {
        self.option(name, Some(value.into()), false)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Builds the argument vector passed to prince(1).
    pub fn args(&self) -> Result<Vec<String>, PrinceError> {
        let config = &self.config;
        let mut args = Vec::new();

        if !config.prefix.is_empty() {
            args.push("--prefix".to_string());
            args.push(config.prefix.clone());
        }
        if !config.license.is_empty() {
            args.push("--license-file".to_string());
            args.push(config.license.clone());
        }
        for (name, value) in &config.options {
            args.push(format!("--{}", name));
            if !value.is_flag() {
                args.push(value.to_string());
            }
        }
        args.extend(config.inputs.iter().cloned());
        for cookie in &config.cookies {
            args.push("--cookie".to_string());
            args.push(cookie.clone());
        }
        if !config.output.is_empty() {
            args.push("--output".to_string());
            args.push(config.output.clone());
        } else if !config.options.contains_key(RASTER_OUTPUT) {
            return Err(PrinceError::MissingOutput);
        }

        Ok(args)
    }

    /// Resolves the configured binary to a file on disk.
    pub fn resolve_binary(&self) -> Result<PathBuf, PrinceError> {
        let binary = &self.config.binary;
        let path = Path::new(binary);
        let found = if path.is_file() {
            path.to_path_buf()
        } else {
            env::find_in_path(binary).ok_or_else(|| PrinceError::BinaryNotFound(binary.clone()))?
        };
        // The child runs in `cwd`, where a relative path would no longer resolve.
        std::path::absolute(&found).map_err(|_| PrinceError::BinaryNotFound(binary.clone()))
    }

    /// Runs prince(1) and returns its captured stdout and stderr.
    ///
    /// A zero exit status is not enough for success: a `prince: error:`
    /// line on stderr also fails the run.
    pub async fn execute(&self) -> Result<Rendered, ExecuteError> {
        let program = self.resolve_binary().map_err(ExecuteError::prepare)?;
        let args = self.args().map_err(ExecuteError::prepare)?;

        info!(
            program = %program.display(),
            inputs = self.config.inputs.len(),
            output = %self.config.output,
            "Executing prince(1)"
        );

        let timeout = match self.config.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        run(
            &program,
            &args,
            Path::new(&self.config.cwd),
            timeout,
            self.config.max_buffer,
        )
        .await
    }
}
