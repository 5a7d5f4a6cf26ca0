use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::StoreError;

/// Opaque revision of a stored value, bumped on every write.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: Version,
}

/// Key-value backend offering a single-key compare-and-swap.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Versioned>, StoreError>> + Send;

    /// Stores `value` only if `key` is still at `expected` (`None` meaning the
    /// key is absent). Returns whether the write happened.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Version>,
        value: String,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Decision of a read-modify-write callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update<T> {
    /// Replace the stored value, then return `T`.
    Write(String, T),
    /// Leave the stored value alone and return `T`.
    Keep(T),
}

/// The storage collaborator the score handler talks to.
///
/// Implementations guarantee that the value `f` saw is the value it replaces:
/// no concurrent update slips in between the read and the write.
pub trait AtomicStore: Send + Sync {
    fn read_modify_write<T, F>(
        &self,
        key: &str,
        f: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        T: Send,
        F: FnMut(Option<&str>) -> Result<Update<T>, StoreError> + Send;
}

/// Optimistic concurrency: read, compute, compare-and-swap, and start over
/// when someone else wrote in between. `f` may run once per attempt.
#[derive(Debug)]
pub struct OptimisticStore<S> {
    inner: S,
    max_attempts: u32,
}

impl<S: KvStore> OptimisticStore<S> {
    pub fn new(inner: S, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: KvStore> AtomicStore for OptimisticStore<S> {
    async fn read_modify_write<T, F>(&self, key: &str, mut f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnMut(Option<&str>) -> Result<Update<T>, StoreError> + Send,
    {
        for attempt in 1..=self.max_attempts {
            let current = self.inner.get(key).await?;
            let (value, version) = match current {
                Some(Versioned { value, version }) => (Some(value), Some(version)),
                None => (None, None),
            };

            match f(value.as_deref())? {
                Update::Keep(output) => return Ok(output),
                Update::Write(next, output) => {
                    if self.inner.compare_and_swap(key, version, next).await? {
                        return Ok(output);
                    }
                    log::debug!("Write conflict on {key}, attempt {attempt}");
                }
            }
        }

        log::warn!(
            "Giving up on {key} after {} conflicting writes",
            self.max_attempts
        );
        Err(StoreError::Conflict {
            attempts: self.max_attempts,
        })
    }
}

/// Single-writer serialization: every read-modify-write in this process
/// waits its turn, so `f` runs exactly once.
///
/// The compare-and-swap is still used to catch writers outside the process.
#[derive(Debug)]
pub struct SerialStore<S> {
    inner: S,
    turn: tokio::sync::Mutex<()>,
}

impl<S: KvStore> SerialStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            turn: tokio::sync::Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: KvStore> AtomicStore for SerialStore<S> {
    async fn read_modify_write<T, F>(&self, key: &str, mut f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnMut(Option<&str>) -> Result<Update<T>, StoreError> + Send,
    {
        let _turn = self.turn.lock().await;

        let current = self.inner.get(key).await?;
        let version = current.as_ref().map(|versioned| versioned.version);
        let value = current.as_ref().map(|versioned| versioned.value.as_str());

        match f(value)? {
            Update::Keep(output) => Ok(output),
            Update::Write(next, output) => {
                if self.inner.compare_and_swap(key, version, next).await? {
                    Ok(output)
                } else {
                    log::warn!("Foreign write on {key} while holding the writer turn");
                    Err(StoreError::Conflict { attempts: 1 })
                }
            }
        }
    }
}

/// In-process [`KvStore`], one version counter shared by all keys.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, Versioned>,
    last_version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one value.
    pub fn with_value(key: &str, value: String) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.insert(key, value);
        }
        store
    }

    /// Current value of `key`, bypassing versioning.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        let state = self.state.lock().ok()?;
        state.values.get(key).map(|versioned| versioned.value.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl MemoryState {
    fn insert(&mut self, key: &str, value: String) {
        self.last_version += 1;
        let version = Version(self.last_version);
        self.values
            .insert(key.to_string(), Versioned { value, version });
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Version>,
        value: String,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let current = state.values.get(key).map(|versioned| versioned.version);
        if current != expected {
            return Ok(false);
        }
        state.insert(key, value);
        Ok(true)
    }
}
