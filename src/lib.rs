//! # iSamples Client
//!
//! Client and CLI for the iSamples central index, a Solr service that
//! aggregates physical-sample records from SESAR, GEOME, OpenContext and
//! the Smithsonian.
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────────────┐
//! │   CLI    │──▶│  IsbClient  │──▶│ iSamples Solr        │
//! │  (isb)   │   │ GET / POST  │   │ thing/select(/info)  │
//! └────┬─────┘   └──────┬──────┘   └──────────────────────┘
//!      │                ▼
//!      │         ┌─────────────┐
//!      └────────▶│ isamples-   │  pivot materialization,
//!                │ core        │  facet parsing, queries
//!                └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | HTTP client for `thing/select` |
//! | [`pivot`] | Pivot tables, live or from a saved response |
//! | [`facets`] | Flat facet counts |
//! | [`records`] | Field names and record counts |
//! | [`render`] | Text output |

pub mod client;
pub mod config;
pub mod facets;
pub mod pivot;
pub mod records;
pub mod render;
