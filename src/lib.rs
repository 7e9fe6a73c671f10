//! # Tableau Context
//!
//! Metadata extraction and context assembly for Tableau workbooks (.twb) and
//! Tableau Prep flows (.tfl).
//!
//! Tableau Context parses workbook and prep-flow XML into canonical JSON
//! metadata records, indexes a historical-issues dataset, and assembles both
//! into a bounded Markdown context block for a downstream prompt layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌─────────────┐   ┌───────────────┐
//! │ .twb / .tfl   │──▶│ Extractors  │──▶│ MetadataStore │
//! │ XML documents │   │ (canonical  │   │ (JSON, keyed  │
//! └───────────────┘   │  records)   │   │  by name)     │
//!                     └─────────────┘   └──────┬────────┘
//!                                              │
//!                     ┌─────────────┐          ▼
//!                     │ Issue index │──▶ ContextAssembler ──▶ context block
//!                     │ (CSV)       │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tbctx parse workbook sample_workbook.twb sales_dashboard
//! tbctx parse flow sample_prepflow.tfl customer_prep_flow
//! tbctx context sales_dashboard --kind workbook
//! tbctx issues sales_dashboard --limit 3
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`document`] | XML document loading |
//! | [`models`] | Canonical metadata records |
//! | [`workbook`] | Workbook (.twb) extraction |
//! | [`prepflow`] | Prep flow (.tfl) extraction |
//! | [`store`] | JSON metadata persistence |
//! | [`issues`] | Historical-issue lookups |
//! | [`context`] | Context block assembly |

pub mod config;
pub mod context;
pub mod document;
pub mod issues;
pub mod models;
pub mod prepflow;
pub mod store;
pub mod workbook;
