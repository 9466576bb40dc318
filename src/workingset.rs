//! Working set
//!
//! Owns the single current globally-merged scope tree. A reader/writer lock
//! arbitrates access: any number of readers, one writer, writers exclude
//! readers. Writers never mutate the shared tree in place; they clone it,
//! fold the change in, and swap the reference, so a reader holding the lock
//! always sees a fully-merged tree and a failed write leaves the previous
//! tree untouched.
//!
//! Change notifications are delivered over crossbeam channels after the
//! write lock is released, and only when the tree actually changed.

use crate::builtins::BuiltInTypeTable;
use crate::frontend::{ExtractorRegistry, FileUnit, ScopeFragment};
use crate::model::tree::ScopeTree;
use crate::{Error, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What changed in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    FileAdded,
    FileUpdated,
    FileRemoved,
    Cleared,
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChange {
    pub kind: ChangeKind,
    /// The affected file, `None` for `Cleared`
    pub file: Option<String>,
}

type TreeLock = Arc<RwLock<Arc<ScopeTree>>>;

/// Owned read guard over the global scope; derefs to the tree.
#[derive(Debug)]
pub struct GlobalScope {
    guard: parking_lot::lock_api::ArcRwLockReadGuard<parking_lot::RawRwLock, Arc<ScopeTree>>,
}

impl GlobalScope {
    /// Cheap snapshot handle that outlives the lock.
    pub fn snapshot(&self) -> Arc<ScopeTree> {
        Arc::clone(&self.guard)
    }
}

impl Deref for GlobalScope {
    type Target = ScopeTree;

    fn deref(&self) -> &ScopeTree {
        &self.guard
    }
}

impl AsRef<ScopeTree> for GlobalScope {
    fn as_ref(&self) -> &ScopeTree {
        self
    }
}

struct Inner {
    tree: TreeLock,
    registry: ExtractorRegistry,
    builtins: BuiltInTypeTable,
    subscribers: Mutex<Vec<Sender<ScopeChange>>>,
    disposed: AtomicBool,
}

/// The working set: sole mutation gate for the global scope tree.
#[derive(Clone)]
pub struct WorkingSet {
    inner: Arc<Inner>,
}

impl WorkingSet {
    /// Create a working set with the default front-end registry.
    pub fn new() -> Self {
        Self::with_registry(crate::frontend::default_registry())
    }

    /// Create a working set with a custom front-end registry.
    pub fn with_registry(registry: ExtractorRegistry) -> Self {
        Self {
            inner: Arc::new(Inner {
                tree: Arc::new(RwLock::new(Arc::new(ScopeTree::new()))),
                registry,
                builtins: BuiltInTypeTable::new(),
                subscribers: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The shared built-in type table for this working set.
    pub fn builtins(&self) -> &BuiltInTypeTable {
        &self.inner.builtins
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> Receiver<ScopeChange> {
        let (sender, receiver) = unbounded();
        self.inner.subscribers.lock().push(sender);
        receiver
    }

    fn notify(&self, change: ScopeChange) {
        self.inner
            .subscribers
            .lock()
            .retain(|s| s.send(change.clone()).is_ok());
    }

    fn ensure_live(&self) -> Result<()> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    /// Run a file through the front end and fold its fragment into the
    /// global scope. An already-present file is removed first, inside the
    /// same write lock, so readers see the update atomically.
    pub fn add_or_update_file(&self, unit: &FileUnit) -> Result<()> {
        self.ensure_live()?;
        let fragment = self.inner.registry.extract(unit)?.ok_or_else(|| {
            Error::InvalidStructure(format!("no front end handles {}", unit.path))
        })?;
        let file = fragment
            .source_file()
            .unwrap_or(unit.path.as_str())
            .to_string();
        self.add_fragment(&file, fragment)
    }

    /// Fold an already-extracted fragment into the global scope under the
    /// given source file name.
    pub fn add_fragment(&self, file: &str, fragment: ScopeFragment) -> Result<()> {
        self.ensure_live()?;
        fragment.validate()?;

        let mut incoming = fragment.root;
        incoming.apply_aliases(&fragment.aliases);

        let kind;
        let changed;
        {
            let mut guard = self.inner.tree.write_arc();
            let mut next = (**guard).clone();
            let had_file = next.contains_file(file);
            if had_file {
                next.remove_file(file);
            }
            next.merge(&incoming)?;
            changed = if had_file {
                !next.structurally_eq(&**guard)
            } else {
                !incoming.is_empty()
            };
            *guard = Arc::new(next);
            kind = if had_file {
                ChangeKind::FileUpdated
            } else {
                ChangeKind::FileAdded
            };
        }
        if changed {
            tracing::debug!(file, ?kind, "working set updated");
            self.notify(ScopeChange {
                kind,
                file: Some(file.to_string()),
            });
        }
        Ok(())
    }

    /// Remove everything a file contributed. Returns whether the tree
    /// changed.
    pub fn remove_file(&self, file: &str) -> Result<bool> {
        self.ensure_live()?;
        let changed;
        {
            let mut guard = self.inner.tree.write_arc();
            if !guard.contains_file(file) {
                return Ok(false);
            }
            let mut next = (**guard).clone();
            changed = next.remove_file(file);
            *guard = Arc::new(next);
        }
        if changed {
            self.notify(ScopeChange {
                kind: ChangeKind::FileRemoved,
                file: Some(file.to_string()),
            });
        }
        Ok(changed)
    }

    /// Drop the whole tree.
    pub fn clear(&self) -> Result<()> {
        self.ensure_live()?;
        self.clear_internal();
        Ok(())
    }

    fn clear_internal(&self) {
        let was_empty;
        {
            let mut guard = self.inner.tree.write_arc();
            was_empty = guard.is_empty();
            if !was_empty {
                *guard = Arc::new(ScopeTree::new());
            }
        }
        if !was_empty {
            self.notify(ScopeChange {
                kind: ChangeKind::Cleared,
                file: None,
            });
        }
    }

    /// Acquire the read lock within `timeout`, surfacing `LockTimeout`
    /// instead of blocking indefinitely. A zero timeout is a try-lock.
    pub fn try_obtain_read_lock(&self, timeout: Duration) -> Result<GlobalScope> {
        self.ensure_live()?;
        match self.inner.tree.try_read_arc_for(timeout) {
            Some(guard) => Ok(GlobalScope { guard }),
            None => Err(Error::LockTimeout {
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Convenience: take a snapshot handle without keeping the lock.
    pub fn snapshot(&self, timeout: Duration) -> Result<Arc<ScopeTree>> {
        Ok(self.try_obtain_read_lock(timeout)?.snapshot())
    }

    /// Clear the tree (firing one final change if non-empty) and refuse all
    /// further operations.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear_internal();
        self.inner.subscribers.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Last handle gone; nothing to notify.
        self.disposed.store(true, Ordering::Release);
    }
}
