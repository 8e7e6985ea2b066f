use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

/// Run rustfmt over generated files.
///
/// The binary defaults to `rustfmt` and can be overridden with
/// `TCV3_RUSTFMT_BIN`.
pub fn format_files(paths: &[PathBuf]) -> std::io::Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let rustfmt_bin = std::env::var("TCV3_RUSTFMT_BIN").unwrap_or_else(|_| "rustfmt".to_string());

    let mut cmd = Command::new(&rustfmt_bin);
    cmd.arg("--edition").arg("2021").args(paths);
    debug!(bin = %rustfmt_bin, files = paths.len(), "Formatting generated files");
    let status = cmd.status()?;
    if !status.success() {
        return Err(std::io::Error::other(format!(
            "{rustfmt_bin} exited with {status}"
        )));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Mutex, OnceLock};

    // Serialize environment mutations to avoid test races
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn stub(dir: &std::path::Path, exit_code: i32) -> PathBuf {
        let path = dir.join("rustfmt");
        fs::write(&path, format!("#!/bin/sh\nexit {exit_code}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn with_rustfmt<T>(bin: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let old_bin = env::var("TCV3_RUSTFMT_BIN").ok();
        env::set_var("TCV3_RUSTFMT_BIN", bin);
        let out = f();
        match old_bin {
            Some(v) => env::set_var("TCV3_RUSTFMT_BIN", v),
            None => env::remove_var("TCV3_RUSTFMT_BIN"),
        }
        out
    }

    #[test]
    fn succeeds_when_rustfmt_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), 0);
        let res = with_rustfmt(&bin, || format_files(&[dir.path().join("a.rs")]));
        assert!(res.is_ok());
    }

    #[test]
    fn reports_rustfmt_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), 1);
        let res = with_rustfmt(&bin, || format_files(&[dir.path().join("a.rs")]));
        assert!(res.is_err());
    }
}
