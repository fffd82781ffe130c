//! File Watcher (spec §4.6): watches a workspace root for create/modify/
//! delete events and emits them, debounced, on a channel.
//!
//! The debounce bookkeeping is ported near-verbatim from the teacher's
//! `watcher/debouncer.rs`; the `notify`-backed watcher itself is a much
//! smaller single-purpose version of the teacher's `UnifiedWatcher` (spec
//! §4.6 has no handler-routing concept — events go straight to the
//! Project Index's `reindexFile`/`removeFile`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};

/// Default time a path must be stable before its event is delivered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Records change timestamps and returns paths stable for `duration`, same
/// shape as the teacher's `Debouncer`.
struct Debouncer {
    pending: HashMap<PathBuf, (Instant, ChangeKind)>,
    duration: Duration,
}

impl Debouncer {
    fn new(duration: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            duration,
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        self.pending.insert(path, (Instant::now(), kind));
    }

    fn take_ready(&mut self) -> Vec<FileChange> {
        let now = Instant::now();
        let mut ready = Vec::new();
        self.pending.retain(|path, (last_change, kind)| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(FileChange {
                    path: path.clone(),
                    kind: *kind,
                });
                false
            } else {
                true
            }
        });
        ready
    }
}

/// Watches `root` and delivers debounced `FileChange` events on `receiver()`
/// until `stop()` is called. `stop()` is idempotent.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<FileChange>,
    watching: Arc<AtomicBool>,
}

impl FileWatcher {
    pub fn start(root: &Path, debounce: Duration) -> notify::Result<Self> {
        let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<Event>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let _ = raw_tx.send(event);
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let (out_tx, out_rx) = crossbeam_channel::unbounded::<FileChange>();
        let watching = Arc::new(AtomicBool::new(true));
        spawn_debounce_loop(raw_rx, out_tx, debounce, Arc::clone(&watching));

        Ok(Self {
            _watcher: watcher,
            receiver: out_rx,
            watching,
        })
    }

    pub fn receiver(&self) -> &Receiver<FileChange> {
        &self.receiver
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.watching.store(false, Ordering::SeqCst);
    }
}

fn classify(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        _ => None,
    }
}

/// Owns the debouncer and drains raw OS events into debounced output on a
/// background thread — never invokes index mutation directly from the
/// notify callback thread.
fn spawn_debounce_loop(
    raw_rx: Receiver<Event>,
    out_tx: Sender<FileChange>,
    debounce: Duration,
    watching: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        let mut debouncer = Debouncer::new(debounce);
        let tick = Duration::from_millis(25);
        while watching.load(Ordering::SeqCst) {
            while let Ok(event) = raw_rx.try_recv() {
                if let Some(kind) = classify(event.kind) {
                    for path in event.paths {
                        debouncer.record(path, kind);
                    }
                }
            }
            for change in debouncer.take_ready() {
                if out_tx.send(change).is_err() {
                    return;
                }
            }
            std::thread::sleep(tick);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_delays_until_stable() {
        let mut debouncer = Debouncer::new(Duration::from_millis(30));
        debouncer.record(PathBuf::from("a.rs"), ChangeKind::Modified);
        assert!(debouncer.take_ready().is_empty());
        std::thread::sleep(Duration::from_millis(40));
        let ready = debouncer.take_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].path, PathBuf::from("a.rs"));
    }

    #[test]
    fn debouncer_resets_timer_on_repeat_change() {
        let mut debouncer = Debouncer::new(Duration::from_millis(40));
        debouncer.record(PathBuf::from("a.rs"), ChangeKind::Modified);
        std::thread::sleep(Duration::from_millis(25));
        debouncer.record(PathBuf::from("a.rs"), ChangeKind::Modified);
        std::thread::sleep(Duration::from_millis(25));
        assert!(debouncer.take_ready().is_empty());
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let watcher = FileWatcher::start(dir.path(), Duration::from_millis(10)).unwrap();
        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_watching());
    }
}
