//! Host-side file writes under the mounted target root.
//!
//! Configuration files (`/etc/hostname`, loader entries, dotfiles) are
//! written directly from the installer rather than through a shell inside
//! the chroot. Paths are given as seen from the installed system and are
//! resolved against the target root, so `/etc/hosts` lands at
//! `/mnt/etc/hosts`.
//!
//! In dry-run mode every write is logged and skipped.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::install_log::InstallLog;

/// Writer for files inside the target root.
#[derive(Debug)]
pub struct TargetFiles<'a> {
    root: PathBuf,
    log: &'a InstallLog,
    dry_run: bool,
}

impl<'a> TargetFiles<'a> {
    pub fn new(root: impl Into<PathBuf>, log: &'a InstallLog) -> Self {
        Self { root: root.into(), log, dry_run: false }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of `inner`, a path inside the installed system.
    pub fn path(&self, inner: &str) -> PathBuf {
        self.root.join(inner.trim_start_matches('/'))
    }

    /// Create or truncate `inner` with `contents`.
    pub fn write(&self, inner: &str, contents: &str) -> Result<()> {
        let path = self.path(inner);
        if self.skip(format_args!("write {}", path.display())) {
            return Ok(());
        }
        self.log.info(format!("Writing {}", path.display()));
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Write `inner` and set its permission bits.
    pub fn write_with_mode(&self, inner: &str, contents: &str, mode: u32) -> Result<()> {
        self.write(inner, contents)?;
        self.set_mode(inner, mode)
    }

    /// Append `contents` to `inner`, creating it if missing.
    pub fn append(&self, inner: &str, contents: &str) -> Result<()> {
        let path = self.path(inner);
        if self.skip(format_args!("append to {}", path.display())) {
            return Ok(());
        }
        self.log.info(format!("Appending to {}", path.display()));
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// `mkdir -p` plus a mode on the leaf directory.
    pub fn create_dir(&self, inner: &str, mode: u32) -> Result<()> {
        let path = self.path(inner);
        if self.skip(format_args!("create directory {}", path.display())) {
            return Ok(());
        }
        self.log.info(format!("Creating directory: {}", path.display()));
        fs::create_dir_all(&path)?;
        if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(mode)) {
            self.log.warn(format!("Failed to set permissions on directory {}: {}", path.display(), e));
        }
        Ok(())
    }

    pub fn set_mode(&self, inner: &str, mode: u32) -> Result<()> {
        let path = self.path(inner);
        if self.skip(format_args!("chmod {:o} {}", mode, path.display())) {
            return Ok(());
        }
        self.log.debug(format!("Setting mode {:o} on {}", mode, path.display()));
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    /// Copy a file from the live system into the target.
    pub fn copy_from_host(&self, source: &Path, inner: &str) -> Result<()> {
        let dest = self.path(inner);
        if self.skip(format_args!("copy {} to {}", source.display(), dest.display())) {
            return Ok(());
        }
        self.log.info(format!("Copying {} to {}", source.display(), dest.display()));
        fs::copy(source, &dest)?;
        Ok(())
    }

    fn skip(&self, action: std::fmt::Arguments<'_>) -> bool {
        if self.dry_run {
            self.log.info(format!("[dry-run] would {}", action));
        }
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, InstallLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = InstallLog::open(dir.path().join("install.log")).unwrap();
        fs::create_dir_all(dir.path().join("root/etc")).unwrap();
        (dir, log)
    }

    #[test]
    fn test_paths_resolve_under_root() {
        let (dir, log) = setup();
        let files = TargetFiles::new(dir.path().join("root"), &log);
        assert_eq!(files.path("/etc/hosts"), dir.path().join("root/etc/hosts"));
        assert_eq!(files.path("etc/hosts"), dir.path().join("root/etc/hosts"));
    }

    #[test]
    fn test_write_append_and_modes() {
        let (dir, log) = setup();
        let files = TargetFiles::new(dir.path().join("root"), &log);

        files.create_dir("/etc/sudoers.d", 0o750).unwrap();
        files.write_with_mode("/etc/sudoers.d/wheel", "%wheel ALL=(ALL:ALL) ALL\n", 0o440).unwrap();
        files.write("/etc/fstab", "# header\n").unwrap();
        files.append("/etc/fstab", "UUID=abc / ext4 rw 0 1\n").unwrap();

        let root = dir.path().join("root");
        let dir_mode = fs::metadata(root.join("etc/sudoers.d")).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o750);
        let file_mode = fs::metadata(root.join("etc/sudoers.d/wheel")).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o440);
        assert_eq!(
            fs::read_to_string(root.join("etc/fstab")).unwrap(),
            "# header\nUUID=abc / ext4 rw 0 1\n"
        );
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (dir, log) = setup();
        let files = TargetFiles::new(dir.path().join("root"), &log).dry_run(true);
        files.write("/etc/hostname", "box\n").unwrap();
        files.copy_from_host(Path::new("/nonexistent/wall.jpg"), "/usr/share/wall.jpg").unwrap();

        assert!(!dir.path().join("root/etc/hostname").exists());
        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[dry-run] would write"));
        assert!(content.contains("[dry-run] would copy /nonexistent/wall.jpg"));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let (dir, log) = setup();
        let files = TargetFiles::new(dir.path().join("root"), &log);
        assert!(files.copy_from_host(Path::new("/nonexistent/wall.jpg"), "/etc/wall.jpg").is_err());
    }
}
