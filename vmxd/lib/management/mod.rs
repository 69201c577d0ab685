//! VM lifecycle management.
//!
//! This module implements the five lifecycle operations the server exposes:
//! - Listing the VMs found in the VM directory
//! - Creating a VM by copying the template descriptor
//! - Deleting a VM's descriptor
//! - Starting and stopping a VM through the virtualization CLI
//!
//! Each operation performs at most one filesystem or process side effect. Nothing is
//! cached between calls; start, stop and list re-scan the VM directory every time.

mod name;
mod template;
mod vm;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use name::*;
pub use template::*;
pub use vm::*;
