//! Table-of-contents document model and the pure operations on it.
//!
//! Data flows backend payload -> [`normalize`] -> [`model::TocRoot`] -> [`edit`] ->
//! [`serialize`] -> backend payload. Nothing in here touches the DOM or the network.

pub(crate) mod edit;
pub(crate) mod flat;
pub(crate) mod model;
pub(crate) mod navigate;
pub(crate) mod normalize;
pub(crate) mod search;
pub(crate) mod serialize;
pub(crate) mod wire;

pub(crate) use model::{NodeKind, TocNode, TocRoot};
pub(crate) use wire::TocRootApi;
