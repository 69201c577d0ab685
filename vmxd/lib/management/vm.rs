use std::{
    fmt::{self, Display},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{fs, io::AsyncWriteExt};

use crate::{
    config::VmxdConfig,
    power::{PowerController, PowerVerb},
    registry::{self, Registry},
    VmxdError, VmxdResult,
};

use super::{rewrite_identity, validate_name};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs VM lifecycle operations against the configured VM directory.
///
/// The manager holds no per-VM state. It is cheap to clone and safe to share across
/// concurrent requests.
#[derive(Clone)]
pub struct VmManager {
    /// The service configuration
    config: Arc<VmxdConfig>,

    /// Changes VM power state
    controller: Arc<dyn PowerController>,
}

/// The outcome of a successful lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// A descriptor was created from the template.
    Created {
        /// The new VM's name.
        name: String,

        /// Where the descriptor was written.
        path: PathBuf,
    },

    /// A descriptor was removed.
    Deleted {
        /// The removed VM's name.
        name: String,
    },

    /// The virtualization CLI accepted a power state change.
    PowerChanged {
        /// The VM's name.
        name: String,

        /// The descriptor path passed to the CLI.
        path: PathBuf,

        /// What was requested.
        verb: PowerVerb,
    },
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmManager {
    /// Creates a new manager.
    pub fn new(config: VmxdConfig, controller: impl PowerController + 'static) -> Self {
        Self::from_shared(Arc::new(config), Arc::new(controller))
    }

    /// Creates a new manager from already shared parts.
    pub fn from_shared(config: Arc<VmxdConfig>, controller: Arc<dyn PowerController>) -> Self {
        Self { config, controller }
    }

    /// The configuration this manager operates with.
    pub fn config(&self) -> &VmxdConfig {
        &self.config
    }

    /// Scans the VM directory.
    pub async fn list(&self) -> VmxdResult<Registry> {
        registry::scan(self.config.get_vm_dir(), self.config.get_extension()).await
    }

    /// Creates a VM called `name` by copying the template descriptor.
    ///
    /// The copy is byte-for-byte unless `rewrite_identity` is enabled in the configuration.
    /// An existing descriptor is never overwritten.
    pub async fn create(&self, name: &str) -> VmxdResult<Ack> {
        validate_name(name)?;
        let path = self.config.descriptor_path(name);

        match fs::symlink_metadata(&path).await {
            Ok(_) => return Err(already_exists(name, &path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(VmxdError::WriteFailed { path, source }),
        }

        let template_path = self.config.template_path();
        let template = fs::read(&template_path)
            .await
            .map_err(|source| VmxdError::TemplateUnreadable {
                path: template_path.clone(),
                source,
            })?;

        let contents = if *self.config.get_rewrite_identity() {
            rewrite_identity(&template, name)
        } else {
            template
        };

        write_new_file(&path, &contents).await.map_err(|source| {
            if source.kind() == ErrorKind::AlreadyExists {
                already_exists(name, &path)
            } else {
                VmxdError::WriteFailed {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        tracing::info!("created vm '{name}' at {}", path.display());

        Ok(Ack::Created {
            name: name.to_string(),
            path,
        })
    }

    /// Deletes the descriptor of the VM called `name`.
    ///
    /// Only the descriptor is removed. Disks, logs and snapshots that the virtualization
    /// tool keeps next to it are left alone.
    pub async fn delete(&self, name: &str) -> VmxdResult<Ack> {
        validate_name(name)?;
        let path = self.config.descriptor_path(name);

        if let Err(e) = fs::symlink_metadata(&path).await {
            if e.kind() == ErrorKind::NotFound {
                return Err(VmxdError::NotFound(name.to_string()));
            }
        }

        fs::remove_file(&path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                VmxdError::NotFound(name.to_string())
            } else {
                VmxdError::DeleteFailed {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        tracing::info!("deleted vm '{name}' at {}", path.display());

        Ok(Ack::Deleted {
            name: name.to_string(),
        })
    }

    /// Powers on the VM called `name`.
    pub async fn start(&self, name: &str) -> VmxdResult<Ack> {
        self.power(PowerVerb::Start, name).await
    }

    /// Powers off the VM called `name`.
    pub async fn stop(&self, name: &str) -> VmxdResult<Ack> {
        self.power(PowerVerb::Stop, name).await
    }

    /// Resolves `name` through a fresh scan and hands its descriptor to the controller.
    pub async fn power(&self, verb: PowerVerb, name: &str) -> VmxdResult<Ack> {
        validate_name(name)?;

        let registry = self.list().await?;
        let path = registry
            .get(name)
            .ok_or_else(|| VmxdError::NotFound(name.to_string()))?
            .to_path_buf();

        self.controller.apply(verb, &path).await.inspect_err(|e| {
            tracing::error!("{e}");
        })?;

        tracing::info!("{} vm '{name}' at {}", verb.past_tense(), path.display());

        Ok(Ack::PowerChanged {
            name: name.to_string(),
            path,
            verb,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn already_exists(name: &str, path: &Path) -> VmxdError {
    VmxdError::AlreadyExists {
        name: name.to_string(),
        path: path.to_path_buf(),
    }
}

/// Writes `contents` to a file that must not exist yet.
async fn write_new_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(path).await?;
    let written = match file.write_all(contents).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(path).await;
        return Err(e);
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::Created { name, path } => write!(
                f,
                "VM '{name}' created successfully at path: {}",
                path.display()
            ),
            Ack::Deleted { name } => write!(f, "VM '{name}' deleted successfully"),
            Ack::PowerChanged { name, path, verb } => write!(
                f,
                "VM '{name}' {} at path: {}",
                verb.past_tense(),
                path.display()
            ),
        }
    }
}

impl fmt::Debug for VmManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;

    const TEMPLATE: &[u8] = b"displayName = \"template\"\nuuid.bios = \"56 4d 00 01\"\n";

    #[test_log::test(tokio::test)]
    async fn test_create_copies_template_verbatim() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;

        let ack = manager.create("web").await?;
        let path = dir.path().join("web.vmx");

        assert_eq!(
            ack,
            Ack::Created {
                name: "web".into(),
                path: path.clone()
            }
        );
        assert_eq!(std::fs::read(&path)?, TEMPLATE);
        assert_eq!(
            ack.to_string(),
            format!("VM 'web' created successfully at path: {}", path.display())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_existing_fails_and_keeps_bytes() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        let path = dir.path().join("web.vmx");
        std::fs::write(&path, b"original")?;

        assert!(matches!(
            manager.create("web").await,
            Err(VmxdError::AlreadyExists { .. })
        ));
        assert_eq!(std::fs::read(&path)?, b"original");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_without_template_is_template_unreadable() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        std::fs::remove_file(dir.path().join("template.vmx"))?;

        assert!(matches!(
            manager.create("web").await,
            Err(VmxdError::TemplateUnreadable { .. })
        ));
        assert!(!dir.path().join("web.vmx").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_rewrite_identity() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("template.vmx"), TEMPLATE)?;
        let config = VmxdConfig::builder()
            .vm_dir(dir.path())
            .rewrite_identity(true)
            .build();
        let manager = VmManager::new(config, helper::RecordingController::default());

        manager.create("web").await?;

        assert_eq!(
            std::fs::read_to_string(dir.path().join("web.vmx"))?,
            "displayName = \"web\"\n"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        std::fs::write(dir.path().join("web.vmx"), b"x")?;

        let ack = manager.delete("web").await?;
        assert_eq!(ack.to_string(), "VM 'web' deleted successfully");
        assert!(!dir.path().join("web.vmx").exists());

        assert!(matches!(
            manager.delete("web").await,
            Err(VmxdError::NotFound(name)) if name == "web"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_leaves_sibling_files() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        std::fs::write(dir.path().join("web.vmx"), b"x")?;
        std::fs::write(dir.path().join("web.vmdk"), b"disk")?;

        manager.delete("web").await?;
        assert!(dir.path().join("web.vmdk").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_directory_is_delete_failed() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        let path = dir.path().join("d.vmx");
        std::fs::create_dir(&path)?;

        match manager.delete("d").await {
            Err(err @ VmxdError::DeleteFailed { .. }) => {
                assert_eq!(err.summary(), "Failed to delete VM");
                assert!(err.details().is_some());
            }
            other => panic!("expected DeleteFailed, got {other:?}"),
        }
        assert!(path.is_dir());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_overlong_name_is_write_failed() -> anyhow::Result<()> {
        let (dir, manager, _) = helper::setup()?;
        let name = "x".repeat(300);

        match manager.create(&name).await {
            Err(err @ VmxdError::WriteFailed { .. }) => {
                assert_eq!(err.summary(), "Failed to create VM");
            }
            other => panic!("expected WriteFailed, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_name_touches_nothing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("missing");
        let controller = helper::RecordingController::default();
        let manager = VmManager::new(
            VmxdConfig::builder().vm_dir(&missing).build(),
            controller.clone(),
        );

        assert!(matches!(manager.create("").await, Err(VmxdError::MissingParameter)));
        assert!(matches!(manager.delete("").await, Err(VmxdError::MissingParameter)));
        assert!(matches!(manager.start("").await, Err(VmxdError::MissingParameter)));
        assert!(matches!(manager.stop("").await, Err(VmxdError::MissingParameter)));
        assert!(controller.calls().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_start_and_stop_use_scanned_path() -> anyhow::Result<()> {
        let (dir, manager, controller) = helper::setup()?;
        std::fs::write(dir.path().join("web.vmx"), b"x")?;
        let path = dir.path().join("web.vmx");

        let ack = manager.start("web").await?;
        assert_eq!(
            ack.to_string(),
            format!("VM 'web' started at path: {}", path.display())
        );

        let ack = manager.stop("web").await?;
        assert_eq!(
            ack.to_string(),
            format!("VM 'web' stopped at path: {}", path.display())
        );

        assert_eq!(
            controller.calls(),
            vec![(PowerVerb::Start, path.clone()), (PowerVerb::Stop, path)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_start_unknown_vm_does_not_invoke_controller() -> anyhow::Result<()> {
        let (_dir, manager, controller) = helper::setup()?;

        assert!(matches!(
            manager.start("ghost").await,
            Err(VmxdError::NotFound(_))
        ));
        assert!(matches!(
            manager.stop("ghost").await,
            Err(VmxdError::NotFound(_))
        ));
        assert!(controller.calls().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_start_surfaces_controller_failure() -> anyhow::Result<()> {
        let (dir, manager, controller) = helper::setup()?;
        std::fs::write(dir.path().join("web.vmx"), b"x")?;
        controller.fail_with("exit status: 1");

        match manager.start("web").await {
            Err(VmxdError::CommandFailed { verb, reason, .. }) => {
                assert_eq!(verb, PowerVerb::Start);
                assert_eq!(reason, "exit status: 1");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_start_with_unreadable_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let controller = helper::RecordingController::default();
        let manager = VmManager::new(
            VmxdConfig::builder().vm_dir(dir.path().join("gone")).build(),
            controller.clone(),
        );

        assert!(matches!(
            manager.start("web").await,
            Err(VmxdError::DirectoryUnreadable { .. })
        ));
        assert!(controller.calls().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_then_list_then_delete() -> anyhow::Result<()> {
        let (_dir, manager, _) = helper::setup()?;

        manager.create("web").await?;
        let registry = manager.list().await?;
        assert!(registry.contains("web"));
        assert!(registry.contains("template"));

        manager.delete("web").await?;
        assert!(!manager.list().await?.contains("web"));

        Ok(())
    }

    mod helper {
        use super::*;

        /// Records power requests instead of launching a process.
        #[derive(Clone, Default)]
        pub(super) struct RecordingController {
            calls: Arc<Mutex<Vec<(PowerVerb, PathBuf)>>>,
            failure: Arc<Mutex<Option<String>>>,
        }

        impl RecordingController {
            pub(super) fn calls(&self) -> Vec<(PowerVerb, PathBuf)> {
                self.calls.lock().unwrap().clone()
            }

            pub(super) fn fail_with(&self, reason: &str) {
                *self.failure.lock().unwrap() = Some(reason.to_string());
            }

            fn record(&self, verb: PowerVerb, path: &Path) -> VmxdResult<()> {
                if let Some(reason) = self.failure.lock().unwrap().clone() {
                    return Err(VmxdError::CommandFailed {
                        verb,
                        path: path.to_path_buf(),
                        reason,
                    });
                }
                self.calls.lock().unwrap().push((verb, path.to_path_buf()));
                Ok(())
            }
        }

        #[async_trait]
        impl PowerController for RecordingController {
            async fn start(&self, path: &Path) -> VmxdResult<()> {
                self.record(PowerVerb::Start, path)
            }

            async fn stop(&self, path: &Path) -> VmxdResult<()> {
                self.record(PowerVerb::Stop, path)
            }
        }

        /// A VM directory holding only the template, and a manager over it.
        pub(super) fn setup() -> anyhow::Result<(TempDir, VmManager, RecordingController)> {
            let dir = TempDir::new()?;
            std::fs::write(dir.path().join("template.vmx"), TEMPLATE)?;

            let controller = RecordingController::default();
            let config = VmxdConfig::builder().vm_dir(dir.path()).build();
            let manager = VmManager::new(config, controller.clone());

            Ok((dir, manager, controller))
        }
    }
}
