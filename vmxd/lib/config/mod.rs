//! Configuration types and helpers.

mod defaults;
mod vmxd;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use vmxd::*;
