//! git
//!
//! Single interface for all object store operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. We use the `git2` crate exclusively (no shelling out to the git
//! CLI).
//!
//! # Responsibilities
//!
//! - Repository discovery, opening and creation
//! - Revision resolution and ancestry queries
//! - The native bookmark set (`refs/bookmarks/*`)
//! - CAS ref updates
//! - Submodule state
//! - Fetch, and history transfer to remote stores
//! - Transports and remote stores ([`mock`] holds in-memory ones for tests)
//!
//! # Invariants
//!
//! - All ref updates that can race use CAS (compare-and-swap) semantics
//! - All operations return strong types (Oid, RefName)

mod interface;
pub mod mock;
mod remote;

pub use interface::{Git, GitError, RefEntry, RepoInfo};
pub use remote::{
    hide_password, local_path, HistoryPush, LocalRemote, LocalTransport, RemoteStore, Transport,
    TransportOptions,
};
