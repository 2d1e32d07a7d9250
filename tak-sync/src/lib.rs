//! Live game-state synchronization.
//!
//! Turns an ordered stream of full or JSON-Patch game-state updates into a
//! minimal set of commands for the viewer widget, the evaluation chart, the
//! status UI and the preference store.
//!
//! # Example
//!
//! ```no_run
//! use tak_sync::{Collaborators, Runner, SyncConfig, Transport};
//!
//! async fn mirror<T: Transport>(transport: T, collaborators: Collaborators) {
//!     let (_viewer_tx, viewer_rx) = tokio::sync::mpsc::channel(16);
//!     let runner = Runner::new(SyncConfig::default(), transport, collaborators);
//!     runner.run(viewer_rx, std::future::pending()).await;
//! }
//! ```

pub mod classify;
pub mod collaborators;
pub mod commands;
pub mod driver;
mod error;
pub mod reconcile;
pub mod retry;
pub mod runner;

pub use classify::{classify, ChangeClassifier, ChangeKind};
pub use collaborators::{
    ChartSink, Collaborators, PreferenceStore, StatusSink, Transport, ViewerWidget,
};
pub use commands::{
    ChartCommand, Command, GoToPly, StatusNotice, TransportEvent, ViewerCommand, ViewerEvent,
    ViewerSyncState,
};
pub use driver::{ConnectionState, SyncConfig, SyncDriver, DEFAULT_RETRY_DELAY};
pub use error::{ReconcileError, SyncError};
pub use reconcile::{reconcile, Delta, HeldDocument};
pub use retry::RetryTimer;
pub use runner::Runner;
