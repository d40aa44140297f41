//! Elevation detection
//!
//! The execution core takes the admin context as an input; this module
//! is where the hosting process determines it once at startup.

/// True when the current process holds administrative privileges.
#[cfg(unix)]
pub fn is_user_admin() -> bool {
    nix::unistd::geteuid().is_root()
}

/// On Windows the practical signal is whether the hosts file, the most
/// privileged resource the suite touches, is writable by this process.
#[cfg(windows)]
pub fn is_user_admin() -> bool {
    use std::fs::OpenOptions;
    use std::path::Path;

    let system_root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".to_string());
    let hosts = Path::new(&system_root).join(r"System32\drivers\etc\hosts");
    OpenOptions::new().append(true).open(hosts).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_does_not_panic() {
        // The answer depends on how the test process was launched; the
        // call itself must always succeed.
        let _ = is_user_admin();
    }
}
