use std::net::{IpAddr, Ipv4Addr};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The suffix that marks a file as a VM descriptor.
pub const DEFAULT_DESCRIPTOR_EXTENSION: &str = ".vmx";

/// The descriptor that new VMs are copied from, relative to the VM directory.
pub const DEFAULT_TEMPLATE_FILENAME: &str = "template.vmx";

/// The virtualization CLI used to change a VM's power state.
pub const DEFAULT_CONTROL_EXE: &str = "vmrun";

/// Default address for the HTTP server
pub const DEFAULT_SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default port for the HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// The origin of the bundled web client.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Environment variable overriding the VM directory.
pub const VM_DIR_ENV_VAR: &str = "VMXD_DIR";

/// Environment variable overriding the template filename.
pub const TEMPLATE_ENV_VAR: &str = "VMXD_TEMPLATE";

/// Environment variable overriding the virtualization CLI.
pub const CONTROL_EXE_ENV_VAR: &str = "VMXD_CONTROL_EXE";

/// Environment variable overriding the server port.
pub const PORT_ENV_VAR: &str = "VMXD_PORT";
