//! PDF Chat workspace
//!
//! The single source of truth for the client: the document registry and selection, the
//! upload pipeline, the viewer state for the selected document and its chat transcript.
//! Surfaces subscribe to `WorkspaceSnapshot`s and dispatch actions on a `Workspace`.

pub mod chat;
pub mod progress;
pub mod registry;
pub mod store;
mod upload;
pub mod viewer;

pub use chat::{ChatSession, PlaceholderResponder, PLACEHOLDER_REPLY};
pub use progress::{ProgressEstimator, SimulatedProgress};
pub use registry::DocumentRegistry;
pub use store::{RefreshOutcome, Workspace, WorkspaceBuilder, WorkspaceSnapshot};
pub use viewer::{ViewerState, MAX_ZOOM, MIN_ZOOM};
