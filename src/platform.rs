use crate::error::ExposeError;

/// Fail early where hard-linked trampolines cannot be relied on.
pub fn ensure_supported() -> Result<(), ExposeError> {
    check(std::env::consts::OS)
}

fn check(os: &str) -> Result<(), ExposeError> {
    if os == "windows" {
        return Err(ExposeError::PlatformUnsupported {
            platform: "Windows".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_is_rejected() {
        let err = check("windows").unwrap_err();
        assert_eq!(err.to_string(), "expose-pixi-apps is not supported on Windows");
    }

    #[test]
    fn test_unix_platforms_are_supported() {
        assert!(check("linux").is_ok());
        assert!(check("macos").is_ok());
    }
}
