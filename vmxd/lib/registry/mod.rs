//! The VM registry: a request-scoped mapping from VM name to descriptor path.
//!
//! A [`Registry`] is built by [`scan`]ning the VM directory and is never cached. Every
//! lookup is a snapshot of the directory at scan time, so a descriptor can disappear
//! between the scan and whatever the caller does with the path.

mod descriptor;
mod scan;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use descriptor::*;
pub use scan::*;
