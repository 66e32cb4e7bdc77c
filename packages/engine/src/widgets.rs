//! Seam to the embedded-widget ("card") subsystem.
//!
//! Cards are externally rendered regions. The engine only needs to recognise
//! their placeholders, know when one is still rendering, and hand them back to
//! the card subsystem when an applied operation touches them.

use scribe_surface::{Surface, SurfaceError, SurfaceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CARD_KEY: &str = "data-card-key";
pub const CARD_TYPE: &str = "data-card-type";
pub const CARD_EDITABLE: &str = "data-card-editable";
/// In-progress render marker. Transient: never part of the model.
pub const CARD_LOADING: &str = "data-card-loading";

/// Who caused an apply pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Undo/redo or any other edit originating on this client.
    Local,
    /// Operations received from a collaborator.
    Remote,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Remote => "remote",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    #[error("Card {node} failed: {message}")]
    Failed { node: SurfaceId, message: String },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Card subsystem hooks. Every method has a default that treats cards as
/// inert markup, which is what [`NoWidgets`] uses.
pub trait Widgets {
    fn is_placeholder(&self, surface: &Surface, node: SurfaceId) -> bool {
        surface.attribute(node, CARD_KEY).is_some()
    }

    fn is_editable(&self, surface: &Surface, node: SurfaceId) -> bool {
        self.is_placeholder(surface, node) && surface.attribute(node, CARD_EDITABLE) == Some("true")
    }

    fn is_loading(&self, surface: &Surface, node: SurfaceId) -> bool {
        self.is_placeholder(surface, node) && surface.attribute(node, CARD_LOADING).is_some()
    }

    /// Whether changes under `node` must stay out of undo history.
    fn exclude_from_history(&self, surface: &Surface, node: SurfaceId) -> bool {
        self.is_loading(surface, node)
    }

    /// Render a freshly inserted placeholder. The default finishes instantly.
    fn render(
        &mut self,
        surface: &mut Surface,
        node: SurfaceId,
        _source: Source,
    ) -> Result<(), WidgetError> {
        surface.remove_attribute(node, CARD_LOADING)?;
        Ok(())
    }

    /// Re-render a non-editable card whose attributes changed.
    fn rerender(
        &mut self,
        _surface: &mut Surface,
        _node: SurfaceId,
        _source: Source,
    ) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Tell an editable card its value changed underneath it.
    fn content_changed(
        &mut self,
        _surface: &mut Surface,
        _node: SurfaceId,
        _source: Source,
    ) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Tear a card down. Implementations must leave `node` detached.
    fn teardown(
        &mut self,
        surface: &mut Surface,
        node: SurfaceId,
        _source: Source,
    ) -> Result<(), WidgetError> {
        surface.remove(node)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoWidgets;

impl Widgets for NoWidgets {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_detection() {
        let mut surface = Surface::new("div");
        let card = surface.create_element("div");
        surface.set_attribute(card, CARD_KEY, "image").unwrap();
        surface.set_attribute(card, CARD_EDITABLE, "true").unwrap();
        let plain = surface.create_element("p");

        let widgets = NoWidgets;
        assert!(widgets.is_placeholder(&surface, card));
        assert!(widgets.is_editable(&surface, card));
        assert!(!widgets.is_loading(&surface, card));
        assert!(!widgets.is_placeholder(&surface, plain));

        surface.set_attribute(card, CARD_LOADING, "remote").unwrap();
        assert!(widgets.exclude_from_history(&surface, card));
    }

    #[test]
    fn test_default_render_clears_loading_marker() {
        let mut surface = Surface::new("div");
        let card = surface.create_element("div");
        surface.set_attribute(card, CARD_KEY, "image").unwrap();
        surface.set_attribute(card, CARD_LOADING, "local").unwrap();

        NoWidgets.render(&mut surface, card, Source::Local).unwrap();
        assert_eq!(surface.attribute(card, CARD_LOADING), None);
    }
}
