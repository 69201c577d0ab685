//! Server state management.
//!
//! This module provides the ServerState type shared by every HTTP request handler.

use crate::management::VmManager;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// Shared server state containing the VM manager
///
/// Cloned into every request. The manager holds no mutable state, so no locking is
/// needed around it.
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Runs the lifecycle operations
    manager: VmManager,

    /// Whether 5xx responses carry the underlying error text
    expose_error_details: bool,
}

impl ServerState {
    /// Creates a new ServerState instance
    pub fn new(manager: VmManager) -> Self {
        let expose_error_details = *manager.config().get_expose_error_details();
        Self {
            manager,
            expose_error_details,
        }
    }

    /// Gets a reference to the VM manager
    pub fn manager(&self) -> &VmManager {
        &self.manager
    }

    /// Whether error responses include underlying causes
    pub fn expose_error_details(&self) -> bool {
        self.expose_error_details
    }
}
