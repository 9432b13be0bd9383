use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::info;

/// Watches the session config file and raises `changed` when it is
/// rewritten. The main loop picks the flag up between steps.
pub fn start(config_path: &Path, changed: Arc<AtomicBool>) -> Result<RecommendedWatcher> {
    info!("watching {} for config changes", config_path.display());

    let file_name = config_path.file_name().map(std::ffi::OsStr::to_os_string);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if event.kind.is_modify() || event.kind.is_create() {
                let hit = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(std::ffi::OsStr::to_os_string) == file_name);
                if hit {
                    changed.store(true, Ordering::SeqCst);
                }
            }
        }
        Err(e) => tracing::error!("config watcher error: {e:?}"),
    })?;

    // Watch the containing directory; editors often replace the file.
    let dir = config_path.parent().filter(|p| !p.as_os_str().is_empty());
    watcher.watch(dir.unwrap_or(Path::new(".")), RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
