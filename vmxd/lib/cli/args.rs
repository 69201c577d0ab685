use std::{net::IpAddr, path::PathBuf};

use clap::Parser;

use crate::{config::VmxdConfig, VmxdResult};

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// `vmxd` serves an HTTP API for listing, creating, deleting, starting and stopping `.vmx` VMs
///
/// Settings are read from the config file first, then from `VMXD_*` environment
/// variables, then from the flags below.
#[derive(Debug, Default, Parser)]
#[command(name = "vmxd", author, about, version, styles=styles::styles())]
pub struct VmxdArgs {
    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the VM descriptors (must be absolute)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Template descriptor filename inside the VM directory
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<String>,

    /// Descriptor file extension
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Virtualization CLI used to start and stop VMs
    #[arg(long, value_name = "PATH")]
    pub control_exe: Option<PathBuf>,

    /// Host type passed to the virtualization CLI as `-T`
    #[arg(long)]
    pub host_type: Option<String>,

    /// Extra argument for start, e.g. `nogui`
    #[arg(long)]
    pub start_mode: Option<String>,

    /// Extra argument for stop, e.g. `soft` or `hard`
    #[arg(long)]
    pub stop_mode: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Browser origin allowed by CORS (repeatable, `*` for any)
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    pub allow_origins: Vec<String>,

    /// Leave OS and subprocess error text out of 5xx responses
    #[arg(long)]
    pub hide_error_details: bool,

    /// Give created VMs their own display name and identifiers
    #[arg(long)]
    pub rewrite_identity: bool,

    /// Also write logs to daily-rolling files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

//-------------------------------------------------------------------------------------------------
// Methods
//-------------------------------------------------------------------------------------------------

impl VmxdArgs {
    /// Builds the effective configuration from the config file, environment and flags.
    pub fn resolve_config(&self) -> VmxdResult<VmxdConfig> {
        let mut config = match &self.config {
            Some(path) => VmxdConfig::load(path)?,
            None => VmxdConfig::default(),
        };

        config.apply_env()?;
        self.apply_to(&mut config);

        Ok(config)
    }

    /// Overrides `config` with every flag that was given.
    pub fn apply_to(&self, config: &mut VmxdConfig) {
        if let Some(dir) = &self.dir {
            config.set_vm_dir(dir.clone());
        }

        if let Some(template) = &self.template {
            config.set_template(template.clone());
        }

        if let Some(extension) = &self.extension {
            config.set_extension(extension.clone());
        }

        if let Some(exe) = &self.control_exe {
            config.set_control_exe(exe.clone());
        }

        if self.host_type.is_some() {
            config.set_host_type(self.host_type.clone());
        }

        if self.start_mode.is_some() {
            config.set_start_mode(self.start_mode.clone());
        }

        if self.stop_mode.is_some() {
            config.set_stop_mode(self.stop_mode.clone());
        }

        if let Some(host) = self.host {
            config.set_host(host);
        }

        if let Some(port) = self.port {
            config.set_port(port);
        }

        if !self.allow_origins.is_empty() {
            config.set_allowed_origins(self.allow_origins.clone());
        }

        if self.hide_error_details {
            config.set_expose_error_details(false);
        }

        if self.rewrite_identity {
            config.set_rewrite_identity(true);
        }

        if self.log_dir.is_some() {
            config.set_log_dir(self.log_dir.clone());
        }
    }
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_are_well_formed() {
        VmxdArgs::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let args = VmxdArgs::parse_from([
            "vmxd",
            "--dir",
            "/srv/vms",
            "--port",
            "9000",
            "--host-type",
            "ws",
            "--allow-origin",
            "http://a",
            "--allow-origin",
            "http://b",
            "--hide-error-details",
        ]);

        let mut config = VmxdConfig::builder()
            .vm_dir("/vms")
            .template("base.vmx")
            .build();
        args.apply_to(&mut config);

        assert_eq!(config.get_vm_dir(), &PathBuf::from("/srv/vms"));
        assert_eq!(*config.get_port(), 9000);
        assert_eq!(config.get_host_type().as_deref(), Some("ws"));
        assert_eq!(config.get_allowed_origins(), &vec!["http://a", "http://b"]);
        assert!(!*config.get_expose_error_details());
        assert_eq!(config.get_template(), "base.vmx");
        assert!(!*config.get_rewrite_identity());
    }

    #[test]
    fn test_no_flags_leaves_config_untouched() {
        let args = VmxdArgs::parse_from(["vmxd"]);
        let mut config = VmxdConfig::builder().vm_dir("/vms").build();
        let before = config.clone();

        args.apply_to(&mut config);
        assert_eq!(config, before);
    }
}
