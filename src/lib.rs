//! Quickfile launcher library.
//!
//! Client-side pieces of the quickfile search system, shared between the
//! interactive launcher and the one-shot CLI:
//!
//! - `protocol` - wire types for the newline-delimited JSON channels
//! - `transport` - duplex over the two session sockets
//! - `highlight` - match-offset segmentation for rendering
//! - `oneshot` - blocking call/response bridge for scripted use
//! - `paths` - socket path resolution
//!
//! The fuzzy-matching daemon on the far end of the sockets is a separate
//! program; this crate only speaks to it.

pub mod highlight;
pub mod oneshot;
pub mod paths;
pub mod protocol;
pub mod transport;
