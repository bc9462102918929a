//! Host sessions and session-scoped user data
//!
//! A [`Session`] stands for one open project/workspace in the host. It
//! carries an identifier, a typed key-value store for per-session state
//! (such as the reusable output surface) and the root of the session's
//! ownership tree.

use crate::lifecycle::Disposable;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed key into a [`UserDataStore`]
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// One slot per key; values are cloned out, so store handles (`Arc`s)
#[derive(Default)]
pub struct UserDataStore {
    slots: Mutex<HashMap<&'static str, Box<dyn Any + Send + Sync>>>,
}

impl UserDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T>(&self, key: &Key<T>) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lock()
            .get(key.name)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Store `value`, returning what the slot held before
    pub fn put<T>(&self, key: &Key<T>, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lock()
            .insert(key.name, Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Current value for `key`, storing `init()` first if the slot is empty
    pub fn get_or_insert_with<T>(&self, key: &Key<T>, init: impl FnOnce() -> T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut slots = self.lock();
        if let Some(value) = slots.get(key.name).and_then(|v| v.downcast_ref::<T>()) {
            return value.clone();
        }
        let value = init();
        slots.insert(key.name, Box::new(value.clone()));
        value
    }

    pub fn remove<T>(&self, key: &Key<T>) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lock()
            .remove(key.name)
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.lock().contains_key(key.name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, Box<dyn Any + Send + Sync>>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for UserDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.lock().keys().copied().collect();
        f.debug_struct("UserDataStore").field("keys", &keys).finish()
    }
}

/// One host session (an open project)
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: String,
    data: UserDataStore,
    root: Disposable,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        let id = SessionId::new();
        debug!("Opened session '{}' ({})", name, id);
        Arc::new(Self {
            id,
            root: Disposable::new(format!("session:{}", name)),
            name,
            data: UserDataStore::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &UserDataStore {
        &self.data
    }

    /// Root of everything this session owns
    pub fn disposable(&self) -> &Disposable {
        &self.root
    }

    /// Tear down everything the session owns
    pub fn close(&self) {
        if self.root.dispose() {
            debug!("Closed session '{}' ({})", self.name, self.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.root.is_disposed()
    }
}
