use std::path::{Path, PathBuf};

use log::warn;
use notify::event::{CreateKind, EventKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::core::ChuteError;

/// Streams newly created CSV paths out of a watched directory tree.
///
/// notify delivers events on its own thread; they are bridged into an
/// unbounded channel and drained by the single ingest worker, one file at a
/// time, in delivery order. A slow load simply backs the channel up.
pub struct DirWatcher {
    rx: UnboundedReceiver<PathBuf>,
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    pub fn start(root: &Path, recursive: bool) -> Result<Self, ChuteError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_))
                        || matches!(event.kind, EventKind::Create(CreateKind::Folder))
                    {
                        return;
                    }
                    for path in event.paths {
                        if is_csv(&path) && !path.is_dir() {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!("Watcher error: {}", e),
            })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode)?;

        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }

    /// Next created CSV path, in delivery order. `None` once the watcher
    /// thread is gone.
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}

/// Only paths with the exact `.csv` suffix are ingested.
fn is_csv(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv_suffix_is_case_sensitive() {
        assert!(is_csv(Path::new("/drop/orders.csv")));
        assert!(!is_csv(Path::new("/drop/orders.CSV")));
        assert!(!is_csv(Path::new("/drop/orders.tsv")));
        assert!(!is_csv(Path::new("/drop/orders")));
        assert!(!is_csv(Path::new("/drop/csv")));
    }
}
