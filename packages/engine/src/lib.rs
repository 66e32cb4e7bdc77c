//! # Scribe Engine
//!
//! Change tracking and reconciliation for a rich-text editing surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ surface: live editable nodes + records      │
//! └─────────────────────────────────────────────┘
//!          ↓ records                 ↑ apply
//! ┌─────────────────────────────────────────────┐
//! │ engine: Model façade                        │
//! │  - capture: batch native records            │
//! │  - transform: records → regions → diff      │
//! │  - stored tree: typed mirror + bindings     │
//! │  - apply: operations → surface              │
//! └─────────────────────────────────────────────┘
//!          ↓ Operation[]             ↑ inverse
//! ┌─────────────────────────────────────────────┐
//! │ consumers: History, collaboration transport │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The surface is the source of truth**: the stored tree is re-derived
//!    from it region by region, never edited by guesswork
//! 2. **Operations are positional**: a path is only meaningful against the
//!    tree state its batch was produced from
//! 3. **Batches are invertible**: `inverse_batch` applied right after a batch
//!    restores the state before it
//! 4. **Transient content is invisible**: selection markers and UI-only
//!    attributes never enter the model or count towards a path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_engine::{EngineConfig, History, Model, Source};
//!
//! let mut model = Model::new(EngineConfig::default());
//! model.attach(&mut surface);
//!
//! // user edits the surface ...
//! let ops = model.flush(&mut surface, Instant::now());
//! history.record(&ops);
//!
//! // remote operations
//! model.apply(&mut surface, &remote_ops, Source::Remote)?;
//! ```

pub mod build;
pub mod capture;
pub mod config;
mod errors;
pub mod history;
pub mod model;
pub mod node;
pub mod operation;
pub mod path;
pub mod schema;
pub mod style;
pub mod transient;
pub mod tree;
pub mod widgets;

pub use build::Builder;
pub use capture::{CaptureState, CapturedRecord, MutationCapture};
pub use config::{EngineConfig, DEFAULT_CONFIG_NAME};
pub use errors::{ApplyError, EngineError};
pub use history::{History, HistoryEntry};
pub use model::{ApplyReport, ListenerId, Model};
pub use node::{Attributes, Node};
pub use operation::apply::{materialize, Applied, Resolved, WidgetEffect};
pub use operation::diff::{diff_nodes, diff_text};
pub use operation::{inverse_batch, Operation, Properties};
pub use path::Path;
pub use schema::{Classification, DefaultSchema, NodeKind, Schema};
pub use transient::Transient;
pub use tree::{NodeKey, Tree};
pub use widgets::{NoWidgets, Source, WidgetError, Widgets};

// Re-export the surface so hosts need only one dependency
pub use scribe_surface::{MutationKind, MutationRecord, Surface, SurfaceError, SurfaceId};
