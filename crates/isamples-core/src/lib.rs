//! # iSamples Core
//!
//! Pure logic for the iSamples client: the facet-pivot data model, pivot
//! materialization into a dense labeled array, flat facet parsing, and
//! Solr select query construction with GET/POST transport selection.
//!
//! This crate performs no network or filesystem I/O. Everything here is
//! a function of its inputs and safe to call from any thread.

pub mod facets;
pub mod models;
pub mod pivot;
pub mod query;
pub mod transport;

pub use models::FacetPivotNode;
pub use pivot::{materialize_pivot, PivotError, PivotTable};
