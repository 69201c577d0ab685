use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use getset::Getters;
use tokio::process::Command;

use crate::{config::VmxdConfig, VmxdError, VmxdResult};

use super::{PowerController, PowerVerb};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`PowerController`] that shells out to a `vmrun`-style CLI.
///
/// The command line is `<exe> [-T <host_type>] <verb> <path> [<mode>]`. No timeout is
/// applied, so a CLI that hangs holds the calling request open.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct CliPowerController {
    /// The executable to launch.
    exe: PathBuf,

    /// Value for the `-T` flag.
    host_type: Option<String>,

    /// Trailing argument for `start`.
    start_mode: Option<String>,

    /// Trailing argument for `stop`.
    stop_mode: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CliPowerController {
    /// Creates a controller that launches `exe` with no extra flags.
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            host_type: None,
            start_mode: None,
            stop_mode: None,
        }
    }

    /// Builds a controller from the service configuration.
    ///
    /// A bare executable name is looked up on `PATH` once, here. If the lookup fails the
    /// name is kept as is and every power request will report the launch failure.
    pub fn from_config(config: &VmxdConfig) -> Self {
        let exe = resolve_exe(config.get_control_exe());
        Self {
            exe,
            host_type: config.get_host_type().clone(),
            start_mode: config.get_start_mode().clone(),
            stop_mode: config.get_stop_mode().clone(),
        }
    }

    /// Sets the `-T` host type.
    pub fn with_host_type(mut self, host_type: impl Into<String>) -> Self {
        self.host_type = Some(host_type.into());
        self
    }

    /// Sets the trailing argument passed to `start`.
    pub fn with_start_mode(mut self, mode: impl Into<String>) -> Self {
        self.start_mode = Some(mode.into());
        self
    }

    /// Sets the trailing argument passed to `stop`.
    pub fn with_stop_mode(mut self, mode: impl Into<String>) -> Self {
        self.stop_mode = Some(mode.into());
        self
    }

    /// The arguments passed to the executable for `verb` on `path`.
    pub fn args(&self, verb: PowerVerb, path: &Path) -> Vec<OsString> {
        let mut args = Vec::new();

        if let Some(host_type) = &self.host_type {
            args.push(OsString::from("-T"));
            args.push(OsString::from(host_type));
        }

        args.push(OsString::from(verb.as_str()));
        args.push(path.as_os_str().to_owned());

        let mode = match verb {
            PowerVerb::Start => &self.start_mode,
            PowerVerb::Stop => &self.stop_mode,
        };

        if let Some(mode) = mode {
            args.push(OsString::from(mode));
        }

        args
    }

    async fn run(&self, verb: PowerVerb, path: &Path) -> VmxdResult<()> {
        let args = self.args(verb, path);
        tracing::debug!("running {} {:?}", self.exe.display(), args);

        let command_failed = |reason: String| VmxdError::CommandFailed {
            verb,
            path: path.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.exe)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| command_failed(format!("failed to launch {}: {e}", self.exe.display())))?;

        if output.status.success() {
            return Ok(());
        }

        // vmrun reports most failures on stdout
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty());

        let reason = match message {
            Some(message) => format!("{}: {message}", output.status),
            None => output.status.to_string(),
        };

        Err(command_failed(reason))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn resolve_exe(exe: &Path) -> PathBuf {
    if exe.components().count() != 1 {
        return exe.to_path_buf();
    }

    match which::which(exe) {
        Ok(resolved) => {
            tracing::info!("using {} at {}", exe.display(), resolved.display());
            resolved
        }
        Err(e) => {
            tracing::warn!("{} not found on PATH: {e}", exe.display());
            exe.to_path_buf()
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl PowerController for CliPowerController {
    async fn start(&self, path: &Path) -> VmxdResult<()> {
        self.run(PowerVerb::Start, path).await
    }

    async fn stop(&self, path: &Path) -> VmxdResult<()> {
        self.run(PowerVerb::Stop, path).await
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_plain() {
        let controller = CliPowerController::new("vmrun");
        let args = controller.args(PowerVerb::Start, Path::new("/vms/a.vmx"));
        assert_eq!(args, vec!["start", "/vms/a.vmx"]);
    }

    #[test]
    fn test_args_with_host_type_and_modes() {
        let controller = CliPowerController::new("vmrun")
            .with_host_type("ws")
            .with_start_mode("nogui")
            .with_stop_mode("soft");

        assert_eq!(
            controller.args(PowerVerb::Start, Path::new("/vms/a.vmx")),
            vec!["-T", "ws", "start", "/vms/a.vmx", "nogui"]
        );
        assert_eq!(
            controller.args(PowerVerb::Stop, Path::new("/vms/a.vmx")),
            vec!["-T", "ws", "stop", "/vms/a.vmx", "soft"]
        );
    }

    #[test]
    fn test_from_config_keeps_explicit_paths() {
        let config = VmxdConfig::builder()
            .vm_dir("/vms")
            .control_exe("/opt/vmware/bin/vmrun")
            .host_type("fusion")
            .build();

        let controller = CliPowerController::from_config(&config);
        assert_eq!(
            controller.get_exe(),
            &PathBuf::from("/opt/vmware/bin/vmrun")
        );
        assert_eq!(controller.get_host_type().as_deref(), Some("fusion"));
        assert!(controller.get_start_mode().is_none());
    }

    #[tokio::test]
    async fn test_missing_executable_is_command_failed() {
        let controller = CliPowerController::new("/nonexistent/vmxd-test/vmrun");

        match controller.start(Path::new("/vms/a.vmx")).await {
            Err(VmxdError::CommandFailed { verb, path, reason }) => {
                assert_eq!(verb, PowerVerb::Start);
                assert_eq!(path, PathBuf::from("/vms/a.vmx"));
                assert!(reason.contains("failed to launch"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    mod unix {
        use std::{fs, os::unix::fs::PermissionsExt};

        use serial_test::serial;
        use tempfile::TempDir;

        use super::*;

        fn write_script(dir: &Path, body: &str) -> anyhow::Result<PathBuf> {
            let path = dir.join("fake-vmrun");
            fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
            Ok(path)
        }

        #[tokio::test]
        #[serial]
        async fn test_successful_run_passes_arguments() -> anyhow::Result<()> {
            let dir = TempDir::new()?;
            let record = dir.path().join("args.txt");
            let exe = write_script(dir.path(), &format!("echo \"$@\" > '{}'", record.display()))?;

            let controller = CliPowerController::new(exe).with_stop_mode("hard");
            controller.stop(Path::new("/vms/a.vmx")).await?;

            assert_eq!(fs::read_to_string(&record)?.trim(), "stop /vms/a.vmx hard");
            Ok(())
        }

        #[tokio::test]
        #[serial]
        async fn test_non_zero_exit_reports_output() -> anyhow::Result<()> {
            let dir = TempDir::new()?;
            let exe = write_script(
                dir.path(),
                "echo 'Error: The virtual machine is not powered on' \nexit 255",
            )?;

            let controller = CliPowerController::new(exe);
            match controller.stop(Path::new("/vms/a.vmx")).await {
                Err(VmxdError::CommandFailed { verb, reason, .. }) => {
                    assert_eq!(verb, PowerVerb::Stop);
                    assert!(reason.contains("255"));
                    assert!(reason.contains("not powered on"));
                }
                other => panic!("expected CommandFailed, got {other:?}"),
            }

            Ok(())
        }
    }
}
