//! The vmxd service configuration.

use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
};

use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{VmxdError, VmxdResult};

use super::{
    CONTROL_EXE_ENV_VAR, DEFAULT_ALLOWED_ORIGIN, DEFAULT_CONTROL_EXE,
    DEFAULT_DESCRIPTOR_EXTENSION, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_TEMPLATE_FILENAME, PORT_ENV_VAR, TEMPLATE_ENV_VAR, VM_DIR_ENV_VAR,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Configuration for the vmxd service.
///
/// Every field except `vm_dir` has a default, so a config file only needs to name the
/// directory that holds the VM descriptors:
///
/// ```toml
/// vm_dir = "/srv/vms"
/// host_type = "ws"
/// start_mode = "nogui"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub with_prefix")]
#[serde(default)]
pub struct VmxdConfig {
    /// The directory scanned for VM descriptors.
    #[builder(setter(into))]
    vm_dir: PathBuf,

    /// Filename of the template descriptor inside `vm_dir`.
    #[builder(default = DEFAULT_TEMPLATE_FILENAME.to_string(), setter(into))]
    template: String,

    /// Suffix identifying descriptor files. Matched literally and case-sensitively.
    #[builder(default = DEFAULT_DESCRIPTOR_EXTENSION.to_string(), setter(into))]
    extension: String,

    /// The virtualization CLI. Bare names are resolved through `PATH`.
    #[builder(default = PathBuf::from(DEFAULT_CONTROL_EXE), setter(into))]
    control_exe: PathBuf,

    /// Host type passed to the CLI as `-T <host_type>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    host_type: Option<String>,

    /// Trailing argument for `start`, e.g. `nogui`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    start_mode: Option<String>,

    /// Trailing argument for `stop`, e.g. `soft`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    stop_mode: Option<String>,

    /// Address to listen on.
    #[builder(default = DEFAULT_SERVER_HOST)]
    host: IpAddr,

    /// Port to listen on.
    #[builder(default = DEFAULT_SERVER_PORT)]
    port: u16,

    /// Origins allowed to call the API from a browser.
    #[builder(default = vec![DEFAULT_ALLOWED_ORIGIN.to_string()])]
    allowed_origins: Vec<String>,

    /// Whether 5xx responses include the underlying OS or subprocess error text.
    #[builder(default = true)]
    expose_error_details: bool,

    /// Whether created descriptors get a fresh identity instead of a verbatim template copy.
    #[builder(default = false)]
    rewrite_identity: bool,

    /// Directory for daily-rolling log files.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    log_dir: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmxdConfig {
    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> VmxdResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Applies `VMXD_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> VmxdResult<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Applies `VMXD_*` overrides using `lookup` to read variables.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> VmxdResult<()> {
        if let Some(dir) = lookup(VM_DIR_ENV_VAR) {
            self.vm_dir = PathBuf::from(dir);
        }

        if let Some(template) = lookup(TEMPLATE_ENV_VAR) {
            self.template = template;
        }

        if let Some(exe) = lookup(CONTROL_EXE_ENV_VAR) {
            self.control_exe = PathBuf::from(exe);
        }

        if let Some(port) = lookup(PORT_ENV_VAR) {
            self.port = port.parse().map_err(|_| {
                VmxdError::InvalidConfig(vec![format!("{PORT_ENV_VAR} is not a valid port: {port}")])
            })?;
        }

        Ok(())
    }

    /// Checks that the configuration can serve requests.
    ///
    /// All problems are collected and reported together.
    pub fn validate(&self) -> VmxdResult<()> {
        let mut errors = Vec::new();

        self.validate_vm_dir(&mut errors);

        if self.extension.is_empty() || !self.extension.starts_with('.') {
            errors.push(format!(
                "extension must be non-empty and start with '.': '{}'",
                self.extension
            ));
        }

        if !is_bare_filename(&self.template) {
            errors.push(format!(
                "template must be a filename inside vm_dir: '{}'",
                self.template
            ));
        }

        if self.port == 0 {
            errors.push("port must be non-zero".to_string());
        }

        if !errors.is_empty() {
            return Err(VmxdError::InvalidConfig(errors));
        }

        let template_path = self.template_path();
        if !template_path.is_file() {
            tracing::warn!(
                "template {} does not exist, create requests will fail until it does",
                template_path.display()
            );
        }

        Ok(())
    }

    fn validate_vm_dir(&self, errors: &mut Vec<String>) {
        let dir = &self.vm_dir;
        if dir.as_os_str().is_empty() {
            errors.push("vm_dir is not set".to_string());
            return;
        }

        if !dir.is_absolute() {
            errors.push(format!("vm_dir must be absolute: {}", dir.display()));
            return;
        }

        if !dir.is_dir() {
            errors.push(format!("vm_dir is not a directory: {}", dir.display()));
            return;
        }

        if let Err(e) = fs::read_dir(dir) {
            errors.push(format!("vm_dir is not readable: {}: {e}", dir.display()));
        }
    }

    /// The absolute path of the template descriptor.
    pub fn template_path(&self) -> PathBuf {
        self.vm_dir.join(&self.template)
    }

    /// The descriptor path a VM called `name` lives at.
    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.vm_dir.join(format!("{name}{}", self.extension))
    }

    /// The address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn is_bare_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for VmxdConfig {
    fn default() -> Self {
        Self::builder().vm_dir(PathBuf::new()).build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
