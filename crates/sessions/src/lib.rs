//! Session persistence for graph runs.
//!
//! A session is identified by a caller-supplied id; its durable form is a
//! [`Checkpoint`] written after every graph step. The [`SessionLockMap`]
//! serializes concurrent turns for the same session.

pub mod checkpoint;
pub mod lock;

pub use checkpoint::{
    scoped, Checkpoint, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
};
pub use lock::{SessionBusy, SessionLockMap};
