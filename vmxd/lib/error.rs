use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};
use thiserror::Error;

use crate::power::PowerVerb;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a vmxd-related operation.
pub type VmxdResult<T> = Result<T, VmxdError>;

/// An error that occurred while serving a VM lifecycle request.
#[derive(Debug, Error)]
pub enum VmxdError {
    /// The required `name` parameter was absent or empty.
    #[error("missing name parameter")]
    MissingParameter,

    /// The VM name cannot be mapped onto a descriptor file in the VM directory.
    #[error("invalid vm name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,

        /// Why the name was rejected.
        reason: &'static str,
    },

    /// The VM directory could not be listed.
    #[error("failed to read vm directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        /// The directory that was scanned.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The template descriptor could not be read.
    #[error("failed to read template {}: {source}", .path.display())]
    TemplateUnreadable {
        /// The template path.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A descriptor already exists for the requested name.
    #[error("vm '{name}' already exists at {}", .path.display())]
    AlreadyExists {
        /// The requested VM name.
        name: String,

        /// The existing descriptor path.
        path: PathBuf,
    },

    /// No descriptor exists for the requested name.
    #[error("vm '{0}' not found")]
    NotFound(String),

    /// The new descriptor could not be written.
    #[error("failed to write descriptor {}: {source}", .path.display())]
    WriteFailed {
        /// The target descriptor path.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The descriptor could not be removed.
    #[error("failed to delete descriptor {}: {source}", .path.display())]
    DeleteFailed {
        /// The descriptor path.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The virtualization CLI could not be launched or exited unsuccessfully.
    #[error("failed to {verb} vm {}: {reason}", .path.display())]
    CommandFailed {
        /// The power verb that was requested.
        verb: PowerVerb,

        /// The descriptor path passed to the CLI.
        path: PathBuf,

        /// Spawn error, or exit status plus stderr.
        reason: String,
    },

    /// The service configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// The configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmxdError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> VmxdError {
        VmxdError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// A short, caller-facing description of the failure.
    ///
    /// Never contains OS error text or subprocess output; see [`VmxdError::details`].
    pub fn summary(&self) -> String {
        match self {
            VmxdError::MissingParameter => "Missing name parameter".to_string(),
            VmxdError::InvalidName { name, reason } => {
                format!("Invalid VM name '{name}': {reason}")
            }
            VmxdError::DirectoryUnreadable { .. } => "Failed to load VMs".to_string(),
            VmxdError::TemplateUnreadable { .. } => "Failed to read template".to_string(),
            VmxdError::AlreadyExists { .. } => "VM already exists".to_string(),
            VmxdError::NotFound(name) => format!("VM '{name}' not found"),
            VmxdError::WriteFailed { .. } => "Failed to create VM".to_string(),
            VmxdError::DeleteFailed { .. } => "Failed to delete VM".to_string(),
            VmxdError::CommandFailed { verb, .. } => format!("Failed to {verb} VM"),
            VmxdError::InvalidConfig(_)
            | VmxdError::ConfigParse(_)
            | VmxdError::Io(_)
            | VmxdError::Custom(_) => "Internal server error".to_string(),
        }
    }

    /// The underlying cause, if the error wraps one.
    pub fn details(&self) -> Option<String> {
        match self {
            VmxdError::MissingParameter
            | VmxdError::InvalidName { .. }
            | VmxdError::AlreadyExists { .. }
            | VmxdError::NotFound(_) => None,
            VmxdError::DirectoryUnreadable { source, .. }
            | VmxdError::TemplateUnreadable { source, .. }
            | VmxdError::WriteFailed { source, .. }
            | VmxdError::DeleteFailed { source, .. } => Some(source.to_string()),
            VmxdError::CommandFailed { reason, .. } => Some(reason.clone()),
            other => Some(other.to_string()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `VmxdResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> VmxdResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
