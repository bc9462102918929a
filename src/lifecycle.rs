//! Scoped resources with parent-child teardown
//!
//! A [`Disposable`] is a node in an explicit ownership tree. Disposing a
//! node disposes its children first (most recently registered first) and
//! then runs its own teardown. Every node tears down at most once, no
//! matter how many parents it has or how many times it is disposed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Teardown = Box<dyn FnOnce() + Send>;

struct Inner {
    name: String,
    disposed: AtomicBool,
    teardown: Mutex<Option<Teardown>>,
    children: Mutex<Vec<Disposable>>,
}

/// Cloneable handle to a node in the ownership tree
#[derive(Clone)]
pub struct Disposable {
    inner: Arc<Inner>,
}

impl Disposable {
    /// A node with no teardown of its own, usually a root
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// A node that runs `teardown` when disposed
    pub fn with_teardown(name: impl Into<String>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self::build(name.into(), Some(Box::new(teardown)))
    }

    /// A node owned by every parent in `parents`; the first parent to be
    /// disposed takes the node down with it
    pub fn with_parents(
        parents: &[&Disposable],
        name: impl Into<String>,
        teardown: impl FnOnce() + Send + 'static,
    ) -> Self {
        let node = Self::with_teardown(name, teardown);
        for parent in parents {
            parent.register(&node);
        }
        node
    }

    fn build(name: String, teardown: Option<Teardown>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                disposed: AtomicBool::new(false),
                teardown: Mutex::new(teardown),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a child node without teardown
    pub fn new_child(&self, name: impl Into<String>) -> Disposable {
        let child = Disposable::new(name);
        self.register(&child);
        child
    }

    /// Create a child node that runs `teardown` when disposed
    pub fn child_with_teardown(
        &self,
        name: impl Into<String>,
        teardown: impl FnOnce() + Send + 'static,
    ) -> Disposable {
        let child = Disposable::with_teardown(name, teardown);
        self.register(&child);
        child
    }

    /// Make `child` owned by this node.
    ///
    /// Registering under an already disposed node disposes `child` right away.
    pub fn register(&self, child: &Disposable) {
        if Arc::ptr_eq(&self.inner, &child.inner) {
            warn!("Refusing to register disposable '{}' under itself", self.name());
            return;
        }

        {
            let mut children = lock(&self.inner.children);
            if !self.is_disposed() {
                children.retain(|c| !c.is_disposed());
                children.push(child.clone());
                return;
            }
        }

        debug!(
            "Parent '{}' already disposed, disposing '{}' immediately",
            self.name(),
            child.name()
        );
        child.dispose();
    }

    /// Tear down this node and everything it owns.
    ///
    /// Returns `true` only for the call that actually performed the teardown.
    pub fn dispose(&self) -> bool {
        if self
            .inner
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let children = std::mem::take(&mut *lock(&self.inner.children));
        for child in children.iter().rev() {
            child.dispose();
        }

        let teardown = lock(&self.inner.teardown).take();
        if let Some(teardown) = teardown {
            teardown();
        }

        trace!("Disposed '{}'", self.name());
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of live children currently owned
    pub fn child_count(&self) -> usize {
        lock(&self.inner.children)
            .iter()
            .filter(|c| !c.is_disposed())
            .count()
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Disposable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("name", &self.inner.name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// A panicking teardown must not wedge the rest of the tree
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
