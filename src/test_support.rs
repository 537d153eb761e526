use crate::config::Config;
use crate::context::WorkspaceContext;
use crate::ledger::Ledger;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Create an initialized workspace in a temp directory and chdir into it.
///
/// Equivalent to what `interlock init` lays down, without going through the
/// command itself (which has its own tests). Keep all three return values
/// alive for the duration of the test.
pub(crate) fn scoped_workspace() -> (TempDir, WorkspaceContext, DirGuard) {
    let temp_dir = TempDir::new().unwrap();
    let guard = DirGuard::new(temp_dir.path());

    let ctx = WorkspaceContext::at_root(temp_dir.path());
    std::fs::create_dir_all(&ctx.locks_dir).unwrap();
    std::fs::create_dir_all(ctx.events_dir()).unwrap();
    crate::fs::atomic_write_file(ctx.config_path(), &Config::default().to_yaml().unwrap())
        .unwrap();

    let mut ledger = Ledger::new();
    ledger.save(&ctx).unwrap();

    (temp_dir, ctx, guard)
}
