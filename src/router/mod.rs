//! Directory tree → axum router.
//!
//! Building happens in two steps. [`RouteTreeBuilder::plan`] walks the tree
//! depth-first and produces a [`RouteNode`] per directory: which methods are
//! served at `/`, which controller actions run for each, which view renders,
//! and the nested sub-resources (static ones first). Wiring then turns the
//! plan into nested axum routers, putting a parameter binder in front of
//! every parameter directory.

mod builder;
mod node;
mod params;
mod pipeline;
pub mod scan;

pub use builder::RouteTreeBuilder;
pub use node::{ChildNode, Endpoint, RouteNode};
pub use scan::SubResource;
