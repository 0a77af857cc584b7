//! Interpreter factory: owns the active type database and tells observers
//! when it is replaced.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::stdlib::standard_database;
use crate::base::LanguageVersion;
use crate::hir::TypeDatabase;

type Observer = Arc<dyn Fn() + Send + Sync>;

pub struct InterpreterFactory {
    database: RwLock<Arc<TypeDatabase>>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer: AtomicU64,
}

impl std::fmt::Debug for InterpreterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterFactory")
            .field("version", &self.version())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl InterpreterFactory {
    pub fn new(database: TypeDatabase) -> Arc<Self> {
        Arc::new(Self {
            database: RwLock::new(Arc::new(database)),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
        })
    }

    /// Factory over the bundled standard-library database.
    pub fn standard(version: LanguageVersion) -> Arc<Self> {
        Self::new(standard_database(version))
    }

    pub fn database(&self) -> Arc<TypeDatabase> {
        self.database.read().clone()
    }

    pub fn version(&self) -> LanguageVersion {
        self.database.read().version()
    }

    /// Register `observer`; it is called after every database replacement
    /// until the returned subscription is dropped.
    pub fn subscribe(self: &Arc<Self>, observer: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().push((id, Arc::new(observer)));
        Subscription {
            factory: self.clone(),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Swap in a new database, e.g. after packages were installed into the
    /// environment, and notify every observer once.
    pub fn replace_database(&self, database: TypeDatabase) {
        *self.database.write() = Arc::new(database);
        let observers: Vec<Observer> = self.observers.lock().iter().map(|(_, o)| o.clone()).collect();
        debug!(observers = observers.len(), "interpreter database replaced");
        for observer in observers {
            observer();
        }
    }
}

/// Keeps an observer registered with an [`InterpreterFactory`].
pub struct Subscription {
    factory: Arc<InterpreterFactory>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.factory.observers.lock().retain(|(id, _)| *id != self.id);
    }
}
