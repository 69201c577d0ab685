//! `vmxd` exposes a small HTTP API over a directory of `.vmx` virtual machine descriptors.
//!
//! # Overview
//!
//! vmxd maps VM names onto descriptor files and delegates power changes to an external
//! virtualization CLI such as `vmrun`. It handles:
//! - Listing the VMs found in a configured directory
//! - Creating VMs by copying a template descriptor
//! - Deleting VM descriptors
//! - Starting and stopping VMs
//!
//! # Architecture
//!
//! - **Registry**: scans the VM directory into a name → path mapping, fresh on every request
//! - **Power**: the [`PowerController`](power::PowerController) seam over the virtualization CLI
//! - **Management**: the five lifecycle operations built on the two above
//! - **Server**: REST API over the lifecycle operations
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use vmxd::{config::VmxdConfig, power::CliPowerController, server::VmxdServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = VmxdConfig::builder().vm_dir("/srv/vms").build();
//!     config.validate()?;
//!
//!     let controller = CliPowerController::from_config(&config);
//!     VmxdServer::new(config, controller).serve().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Service configuration and validation
//! - [`registry`] - Directory scanning
//! - [`power`] - VM power control
//! - [`management`] - VM lifecycle operations
//! - [`server`] - REST API server implementation

#![warn(missing_docs)]

mod error;
mod log;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod config;
pub mod management;
pub mod power;
pub mod registry;
pub mod server;

pub use error::*;
pub use log::*;
