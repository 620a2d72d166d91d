//! git::mock
//!
//! In-memory remote stores for deterministic testing.
//!
//! # Design
//!
//! [`MockTransport`] hands out [`MockRemote`]s keyed by destination and
//! records every connection. A `MockRemote` keeps its keys and the set of
//! commits it holds in memory and records every call, so tests can assert
//! exactly which conditional updates a push attempted. Failure scenarios
//! (refused connections, failing history pushes, a concurrent writer racing
//! the listing) are configured up front.
//!
//! # Example
//!
//! ```
//! use tether::core::types::Oid;
//! use tether::git::mock::{MockOperation, MockTransport};
//! use tether::git::{RemoteStore, Transport, TransportOptions};
//!
//! let transport = MockTransport::new();
//! let tip = Oid::new("a".repeat(40)).unwrap();
//! transport.remote("/srv/app").set_key("bookmarks", "main", &tip);
//!
//! let remote = transport.connect("/srv/app", &TransportOptions::new()).unwrap();
//! let keys = remote.list_keys("bookmarks").unwrap();
//! assert_eq!(keys.get("main"), Some(&tip));
//!
//! assert_eq!(
//!     transport.remote("/srv/app").operations(),
//!     vec![MockOperation::ListKeys { namespace: "bookmarks".into() }]
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::interface::{Git, GitError};
use super::remote::{HistoryPush, RemoteStore, Transport, TransportOptions};
use crate::core::types::Oid;

/// A call recorded by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListKeys {
        namespace: String,
    },
    PushKey {
        namespace: String,
        key: String,
        old: Option<Oid>,
        new: Oid,
    },
    PushHistory {
        revisions: Vec<Oid>,
    },
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    keys: BTreeMap<String, BTreeMap<String, Oid>>,
    commits: BTreeSet<Oid>,
    operations: Vec<MockOperation>,
    fail_history: Option<String>,
    /// Applied right after the next listing returns.
    race: Option<(String, String, Oid)>,
}

/// An in-memory remote store. Clones share state.
#[derive(Debug, Clone)]
pub struct MockRemote {
    url: String,
    inner: Arc<Mutex<MockRemoteInner>>,
}

impl MockRemote {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            inner: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockRemoteInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set a key directly, bypassing the conditional update.
    pub fn set_key(&self, namespace: &str, key: &str, value: &Oid) {
        let mut inner = self.lock();
        inner.commits.insert(value.clone());
        inner
            .keys
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
    }

    /// Current value of a key.
    pub fn key(&self, namespace: &str, key: &str) -> Option<Oid> {
        self.lock()
            .keys
            .get(namespace)
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    /// Mark a commit as present in the store.
    pub fn add_commit(&self, oid: &Oid) {
        self.lock().commits.insert(oid.clone());
    }

    /// Make every history push fail with `message`.
    pub fn fail_history(&self, message: impl Into<String>) {
        self.lock().fail_history = Some(message.into());
    }

    /// Have a concurrent writer set `key` to `value` just after the next
    /// listing of `namespace` returns.
    pub fn race_after_listing(&self, namespace: &str, key: &str, value: &Oid) {
        self.lock().race = Some((namespace.to_string(), key.to_string(), value.clone()));
    }

    /// Every call made so far, in order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// The conditional updates attempted so far.
    pub fn push_key_calls(&self) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(|op| matches!(op, MockOperation::PushKey { .. }))
            .collect()
    }
}

impl RemoteStore for MockRemote {
    fn url(&self) -> &str {
        &self.url
    }

    fn list_keys(&self, namespace: &str) -> Result<BTreeMap<String, Oid>, GitError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::ListKeys {
            namespace: namespace.to_string(),
        });
        let listed = inner.keys.get(namespace).cloned().unwrap_or_default();

        if let Some((ns, key, value)) = inner.race.take() {
            if ns == namespace {
                inner.commits.insert(value.clone());
                inner.keys.entry(ns).or_default().insert(key, value);
            } else {
                inner.race = Some((ns, key, value));
            }
        }

        Ok(listed)
    }

    fn push_key(
        &self,
        namespace: &str,
        key: &str,
        expected_old: Option<&Oid>,
        new: &Oid,
    ) -> Result<bool, GitError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::PushKey {
            namespace: namespace.to_string(),
            key: key.to_string(),
            old: expected_old.cloned(),
            new: new.clone(),
        });

        if !inner.commits.contains(new) {
            return Ok(false);
        }
        let keys = inner.keys.entry(namespace.to_string()).or_default();
        if keys.get(key) != expected_old {
            return Ok(false);
        }
        keys.insert(key.to_string(), new.clone());
        Ok(true)
    }

    fn push_history(&self, _source: &Git, revisions: &[Oid]) -> Result<HistoryPush, GitError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::PushHistory {
            revisions: revisions.to_vec(),
        });

        if let Some(message) = &inner.fail_history {
            return Err(GitError::RemoteUnreachable {
                url: self.url.clone(),
                message: message.clone(),
            });
        }

        let mut sent = 0;
        for rev in revisions {
            if inner.commits.insert(rev.clone()) {
                sent += 1;
            }
        }
        Ok(if sent == 0 {
            HistoryPush::UpToDate
        } else {
            HistoryPush::Sent { objects: sent }
        })
    }
}

#[derive(Debug, Default)]
struct MockTransportInner {
    remotes: HashMap<String, MockRemote>,
    refused: BTreeSet<String>,
    connections: Vec<(String, TransportOptions)>,
}

/// Transport over [`MockRemote`]s. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The remote at `destination`, created empty on first use.
    pub fn remote(&self, destination: &str) -> MockRemote {
        self.lock()
            .remotes
            .entry(destination.to_string())
            .or_insert_with(|| MockRemote::new(destination))
            .clone()
    }

    /// Refuse connections to `destination`.
    pub fn refuse(&self, destination: &str) {
        self.lock().refused.insert(destination.to_string());
    }

    /// Destinations connected to so far, in order.
    pub fn connections(&self) -> Vec<String> {
        self.lock()
            .connections
            .iter()
            .map(|(dest, _)| dest.clone())
            .collect()
    }

    /// Options passed with each connection, in order.
    pub fn connection_options(&self) -> Vec<TransportOptions> {
        self.lock()
            .connections
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }
}

impl Transport for MockTransport {
    fn connect(
        &self,
        destination: &str,
        options: &TransportOptions,
    ) -> Result<Box<dyn RemoteStore>, GitError> {
        let refused = {
            let mut inner = self.lock();
            inner
                .connections
                .push((destination.to_string(), options.clone()));
            inner.refused.contains(destination)
        };
        if refused {
            return Err(GitError::RemoteUnreachable {
                url: destination.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Box::new(self.remote(destination)))
    }
}
