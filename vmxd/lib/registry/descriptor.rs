use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use getset::Getters;
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A VM known by its descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub with_prefix")]
pub struct VmDescriptor {
    /// The descriptor's file name without its extension.
    name: String,

    /// Where the descriptor lives.
    path: PathBuf,
}

/// Mapping from VM name to descriptor path.
///
/// Serializes as a flat JSON object, e.g. `{"web": "/vms/web.vmx"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<String, PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmDescriptor {
    /// Creates a new descriptor reference.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, descriptor: VmDescriptor) {
        self.entries.insert(descriptor.name, descriptor.path);
    }

    /// Resolves a VM name to its descriptor path.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Whether a VM called `name` was present at scan time.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of VMs found.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no VMs were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// VM names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(name, path)` pairs in lexical order of name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromIterator<VmDescriptor> for Registry {
    fn from_iter<I: IntoIterator<Item = VmDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.insert(descriptor);
        }
        registry
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
