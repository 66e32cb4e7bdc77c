//! # Scribe Surface
//!
//! In-memory stand-in for a browser's editable region.
//!
//! The surface is what users (and IME, and widgets) mutate directly. It knows
//! nothing about documents or operations; it only stores nodes and, while
//! observed, queues a [`MutationRecord`] for every change the way a native
//! mutation observer would.
//!
//! ```rust,ignore
//! let mut surface = Surface::new("div");
//! surface.observe(true);
//! let p = surface.create_element("p");
//! surface.append_child(surface.root(), p)?;
//! let records = surface.take_records();
//! ```

mod error;
mod html;
mod record;
mod surface;

pub use error::{SurfaceError, SurfaceResult};
pub use record::{MutationKind, MutationRecord};
pub use surface::{byte_offset, Surface, SurfaceData, SurfaceId};
