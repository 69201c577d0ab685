use crate::{VmxdError, VmxdResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Checks that `name` can be turned into a descriptor path inside the VM directory.
///
/// An empty name is a [`VmxdError::MissingParameter`]. Names that would escape the VM
/// directory are rejected with [`VmxdError::InvalidName`].
pub fn validate_name(name: &str) -> VmxdResult<()> {
    if name.is_empty() {
        return Err(VmxdError::MissingParameter);
    }

    let reason = if name.contains(['/', '\\']) {
        "must not contain path separators"
    } else if name == "." || name == ".." {
        "must not be a relative path component"
    } else if name.contains('\0') {
        "must not contain NUL characters"
    } else {
        return Ok(());
    };

    Err(VmxdError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_plain_names() {
        for name in ["web", "Windows 11", "db-01", "a.b", "..."] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_validate_name_empty_is_missing_parameter() {
        assert!(matches!(
            validate_name(""),
            Err(VmxdError::MissingParameter)
        ));
    }

    #[test]
    fn test_validate_name_rejects_escapes() {
        for name in ["../etc/passwd", "a/b", "a\\b", ".", "..", "a\0b"] {
            assert!(
                matches!(validate_name(name), Err(VmxdError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }
}
