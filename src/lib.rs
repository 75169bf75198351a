//! PLP: PCBA Log Parser
//!
//! Pulls the JSON payloads that manufacturing test stations embed in their
//! text logs, types them as download, station and step records, correlates
//! them per unit (PCBA number) and writes them to a SQLite store.
//!
//! The stages live in [`parser`] (extract, classify, combine, decode) and
//! [`pipeline`] (group, dispatch, per-file ingest); [`store`] is the
//! persistence side.

pub mod cli;
pub mod core;
pub mod entities;
pub mod parser;
pub mod pipeline;
pub mod store;
