//! # Model
//!
//! One model per editable surface. It owns the stored tree and its bindings,
//! the mutation capture, and the change listeners; nothing else writes to
//! them.
//!
//! ## Flow
//!
//! ```text
//! surface edit ─▶ capture ─▶ flush() ─▶ transform ─▶ stored tree ─▶ listeners
//!                                                        ▲
//! remote / undo ops ─▶ apply() ─▶ surface (unobserved) ──┘
//! ```
//!
//! `flush` and `apply` both take `&mut self`, so a diff pass can never run
//! while an apply is in flight. Observation is switched off for the duration
//! of `apply` so its own surface edits never come back as records.

use crate::build::Builder;
use crate::capture::{CapturedRecord, MutationCapture};
use crate::config::EngineConfig;
use crate::errors::ApplyError;
use crate::node::Node;
use crate::operation::apply::apply_operation;
use crate::operation::transform::transform;
use crate::operation::Operation;
use crate::path::Path;
use crate::schema::{DefaultSchema, Schema};
use crate::transient::Transient;
use crate::tree::{NodeKey, Tree};
use crate::widgets::{NoWidgets, Source, Widgets};
use scribe_surface::{MutationRecord, Surface, SurfaceId};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Handle returned by [`Model::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&[Operation])>;

/// Outcome of [`Model::apply`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Operations left out, by index in the batch.
    pub skipped: Vec<(usize, ApplyError)>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct Model {
    config: EngineConfig,
    schema: Box<dyn Schema>,
    widgets: Box<dyn Widgets>,
    transient: Transient,
    tree: Tree,
    capture: MutationCapture,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    attached: bool,
    version: u64,
}

impl Model {
    pub fn new(config: EngineConfig) -> Self {
        let transient = Transient::new(config.transient_attributes.iter().cloned());
        let capture = MutationCapture::new(config.cache_debounce());
        Self {
            config,
            schema: Box::new(DefaultSchema),
            widgets: Box::new(NoWidgets),
            transient,
            tree: Tree::new(),
            capture,
            listeners: Vec::new(),
            next_listener: 0,
            attached: false,
            version: 0,
        }
    }

    pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Box::new(schema);
        self
    }

    pub fn with_widgets(mut self, widgets: impl Widgets + 'static) -> Self {
        self.widgets = Box::new(widgets);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Incremented for every non-empty batch produced or applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn capture(&self) -> &MutationCapture {
        &self.capture
    }

    /// Caching control for hosts (`start_cache`, `submit_cache`, ...).
    pub fn capture_mut(&mut self) -> &mut MutationCapture {
        &mut self.capture
    }

    // Lifecycle

    /// Build the stored tree from the surface and start capturing changes.
    pub fn attach(&mut self, surface: &mut Surface) {
        self.reset(surface);
        self.capture.start(surface);
        self.attached = true;
        info!(nodes = self.tree.len(), "Model attached");
    }

    /// Rebuild the stored tree from the surface as it is now.
    pub fn reset(&mut self, surface: &Surface) {
        self.tree.clear();
        let builder = Builder::new(
            surface,
            self.schema.as_ref(),
            self.widgets.as_ref(),
            &self.transient,
        )
        .normalize_styles(self.config.normalize_styles);
        if let Some(root) = builder.build(&mut self.tree, surface.root(), false) {
            self.tree.set_root(root);
        }
        info!(nodes = self.tree.len(), bindings = self.tree.binding_count(), "Model reset");
    }

    /// Stop capturing and drop the stored tree and every binding.
    pub fn detach(&mut self, surface: &mut Surface) {
        self.capture.stop(surface);
        self.tree.clear();
        self.attached = false;
        info!("Model detached");
    }

    // Change tracking

    /// Pull pending surface records through capture and transform the batch,
    /// if one is ready. Listeners are notified before this returns.
    pub fn flush(&mut self, surface: &mut Surface, now: Instant) -> Vec<Operation> {
        match self.capture.poll(surface, now) {
            Some(batch) => self.transform(surface, &batch),
            None => Vec::new(),
        }
    }

    /// Transform a batch of captured records against the stored tree.
    pub fn transform(&mut self, surface: &Surface, records: &[CapturedRecord]) -> Vec<Operation> {
        let snapshots: HashMap<SurfaceId, String> = records
            .iter()
            .filter_map(|captured| Some((captured.record.target, captured.text.clone()?)))
            .collect();
        let raw: Vec<MutationRecord> = records.iter().map(|captured| captured.record.clone()).collect();

        let builder = Builder::new(
            surface,
            self.schema.as_ref(),
            self.widgets.as_ref(),
            &self.transient,
        )
        .normalize_styles(self.config.normalize_styles)
        .with_snapshots(snapshots);
        let ops = transform(&builder, &mut self.tree, &raw);

        if !ops.is_empty() {
            self.version += 1;
            debug!(operations = ops.len(), version = self.version, "Change batch produced");
            self.emit(&ops);
        }
        ops
    }

    pub fn on_change(&mut self, listener: impl FnMut(&[Operation]) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether a listener was removed.
    pub fn off_change(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, ops: &[Operation]) {
        for (_, listener) in &mut self.listeners {
            listener(ops);
        }
    }

    // Queries

    pub fn find_node(&self, path: &[usize]) -> Option<Node> {
        self.tree.find(path).and_then(|key| self.tree.node(key))
    }

    pub fn find_surface(&self, path: &[usize]) -> Option<SurfaceId> {
        self.tree.find(path).and_then(|key| self.tree.surface_of(key))
    }

    /// Owned copy of the whole stored tree; `None` before `attach`.
    pub fn root(&self) -> Option<Node> {
        self.tree.root().and_then(|key| self.tree.node(key))
    }

    pub fn path_of(&self, node: SurfaceId) -> Option<Path> {
        self.tree.key_for(node).and_then(|key| self.tree.get_path(key))
    }

    // Apply

    /// Apply `operations` in order to the surface and the stored tree.
    ///
    /// Operations that cannot be resolved are skipped and reported; a widget
    /// failure aborts the rest of the batch. Everything applied before the
    /// failure stays applied.
    pub fn apply(
        &mut self,
        surface: &mut Surface,
        operations: &[Operation],
        source: Source,
    ) -> Result<ApplyReport, ApplyError> {
        if self.tree.root().is_none() {
            self.reset(surface);
        }

        let observed = surface.is_observed();
        surface.observe(false);
        let result = self.apply_batch(surface, operations, source);
        surface.observe(observed);

        if let Ok(report) = &result {
            if report.applied > 0 {
                self.version += 1;
            }
        }
        result
    }

    fn apply_batch(
        &mut self,
        surface: &mut Surface,
        operations: &[Operation],
        source: Source,
    ) -> Result<ApplyReport, ApplyError> {
        let mut report = ApplyReport::default();

        for (index, operation) in operations.iter().enumerate() {
            match self.apply_one(surface, operation, source) {
                Ok(()) => report.applied += 1,
                Err(error) if error.is_skippable() => {
                    warn!(
                        index,
                        operation = operation.name(),
                        path = ?operation.path(),
                        %error,
                        "Operation skipped"
                    );
                    report.skipped.push((index, error));
                }
                Err(error) => return Err(error),
            }
        }

        debug!(
            applied = report.applied,
            skipped = report.skipped.len(),
            source = source.as_str(),
            "Batch applied"
        );
        Ok(report)
    }

    fn apply_one(
        &mut self,
        surface: &mut Surface,
        operation: &Operation,
        source: Source,
    ) -> Result<(), ApplyError> {
        let applied = apply_operation(
            surface,
            &self.transient,
            self.widgets.as_mut(),
            operation,
            source,
        )?;

        match self.tree.apply(operation) {
            Ok(Some(key)) => {
                if let Some(node) = applied.node {
                    self.bind_subtree(surface, key, node);
                }
                self.tree.classify_subtree(key, self.schema.as_ref());
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    operation = operation.name(),
                    path = ?operation.path(),
                    %error,
                    "Stored tree out of sync with the surface, rebuilding"
                );
                self.reset(surface);
            }
        }

        if let Some(effect) = applied.effect {
            effect.run(self.widgets.as_mut(), surface, source)?;
        }
        Ok(())
    }

    fn bind_subtree(&mut self, surface: &Surface, key: NodeKey, node: SurfaceId) {
        self.tree.bind(key, node);
        let keys = self.tree.children(key).to_vec();
        let live = self.transient.children(surface, node);
        for (child_key, child_node) in keys.into_iter().zip(live) {
            self.bind_subtree(surface, child_key, child_node);
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("attached", &self.attached)
            .field("version", &self.version)
            .field("nodes", &self.tree.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
