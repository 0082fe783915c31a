// Self-update: replace the running executable with the build the service
// publishes, and the version check that suggests doing so.
//
// The new image is written to `<exe>.new` first and only renamed over the
// executable once it is complete and on disk. A failed or short download
// leaves the current executable untouched.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::api::ApiClient;

/// Version of this build, compared against `/cli/version`.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const STAGING_SUFFIX: &str = ".new";

/// Replaces one executable file in place.
pub struct SelfUpdater {
    exe_path: PathBuf,
}

impl SelfUpdater {
    /// Updater targeting the currently running binary.
    pub fn new() -> Result<Self> {
        let exe_path =
            std::env::current_exe().context("Failed to get current executable path")?;
        debug!("self-update target: {:?}", exe_path);
        Ok(Self { exe_path })
    }

    /// Updater targeting an arbitrary executable path.
    pub fn for_executable(exe_path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: exe_path.into(),
        }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    /// Sibling path the new image is written to before the swap.
    pub fn staging_path(&self) -> PathBuf {
        let mut staged = self.exe_path.as_os_str().to_os_string();
        staged.push(STAGING_SUFFIX);
        PathBuf::from(staged)
    }

    /// Download the published binary and swap it in.
    pub fn update(&self, api: &ApiClient) -> Result<u64> {
        let res = api.fetch_binary()?;
        let expected = res.content_length();
        self.install(res, expected)
    }

    /// Stage `body` next to the executable and rename it into place.
    ///
    /// When `expected_len` is known, a body of any other length is
    /// rejected before the executable is touched. Returns the number of
    /// bytes installed.
    pub fn install<R: Read>(&self, body: R, expected_len: Option<u64>) -> Result<u64> {
        let staged = self.staging_path();
        let written = match stage(body, expected_len, &staged) {
            Ok(n) => n,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&staged) {
                    debug!("could not remove {:?}: {}", staged, rm);
                }
                return Err(e);
            }
        };
        self.swap(&staged)?;
        info!("installed {} bytes at {:?}", written, self.exe_path);
        Ok(written)
    }

    #[cfg(not(windows))]
    fn swap(&self, staged: &Path) -> Result<()> {
        fs::rename(staged, &self.exe_path).with_context(|| {
            format!(
                "Failed to replace {} with {}",
                self.exe_path.display(),
                staged.display()
            )
        })
    }

    // A running executable cannot be overwritten on Windows, but it can be
    // renamed aside.
    #[cfg(windows)]
    fn swap(&self, staged: &Path) -> Result<()> {
        let old = self.exe_path.with_extension("old");
        if old.exists() {
            if let Err(e) = fs::remove_file(&old) {
                warn!("could not remove stale {:?}: {}", old, e);
            }
        }
        if self.exe_path.exists() {
            fs::rename(&self.exe_path, &old).context("Failed to move current binary aside")?;
        }
        if let Err(e) = fs::rename(staged, &self.exe_path) {
            warn!("rename failed, restoring previous binary: {}", e);
            if let Err(restore) = fs::rename(&old, &self.exe_path) {
                warn!(
                    "could not restore {:?} from {:?}: {}",
                    self.exe_path, old, restore
                );
            }
            return Err(e).context("Failed to replace binary (rename)");
        }
        Ok(())
    }
}

fn stage<R: Read>(mut body: R, expected_len: Option<u64>, staged: &Path) -> Result<u64> {
    let mut out = File::create(staged)
        .with_context(|| format!("Failed to create {}", staged.display()))?;
    let written = io::copy(&mut body, &mut out)
        .with_context(|| format!("Failed to write {}", staged.display()))?;

    if let Some(expected) = expected_len {
        if written != expected {
            warn!("download size mismatch: expected {}, got {}", expected, written);
            bail!(
                "Download incomplete: expected {} bytes, got {}",
                expected,
                written
            );
        }
    }
    if written == 0 {
        bail!("Downloaded binary is empty");
    }

    out.flush()?;
    out.sync_all()
        .with_context(|| format!("Failed to sync {}", staged.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to mark {} executable", staged.display()))?;
    }

    Ok(written)
}

/// Ask the service for its advertised CLI version. Returns it when it is
/// non-empty and differs from `current`; any failure yields `None`.
pub fn available_update(api: &ApiClient, current: &str) -> Option<String> {
    match api.remote_version() {
        Ok(remote) if !remote.is_empty() && remote != current => Some(remote),
        Ok(_) => None,
        Err(e) => {
            debug!("version check skipped: {:#}", e);
            None
        }
    }
}
