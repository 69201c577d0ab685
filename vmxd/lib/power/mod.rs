//! Power control for VMs.
//!
//! The virtualization tool is reached through the narrow [`PowerController`] trait so that
//! the process-backed [`CliPowerController`] can be swapped for a fake in tests.

mod process;

use std::{
    fmt::{self, Display},
    path::Path,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::VmxdResult;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use process::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A power state change understood by the virtualization CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerVerb {
    /// Power the VM on.
    Start,

    /// Power the VM off.
    Stop,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Changes the power state of the VM described by a descriptor file.
///
/// Success means only that the request was accepted; implementations do not confirm
/// that the VM actually reached the requested state.
#[async_trait]
pub trait PowerController: Send + Sync {
    /// Powers on the VM at `path`.
    async fn start(&self, path: &Path) -> VmxdResult<()>;

    /// Powers off the VM at `path`.
    async fn stop(&self, path: &Path) -> VmxdResult<()>;

    /// Dispatches to [`start`](Self::start) or [`stop`](Self::stop).
    async fn apply(&self, verb: PowerVerb, path: &Path) -> VmxdResult<()> {
        match verb {
            PowerVerb::Start => self.start(path).await,
            PowerVerb::Stop => self.stop(path).await,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PowerVerb {
    /// The verb as passed on the CLI's command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerVerb::Start => "start",
            PowerVerb::Stop => "stop",
        }
    }

    /// Past tense, for acknowledgements.
    pub fn past_tense(&self) -> &'static str {
        match self {
            PowerVerb::Start => "started",
            PowerVerb::Stop => "stopped",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for PowerVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
