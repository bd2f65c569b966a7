//! Rare-disease ranking over Orphanet clinical-sign associations.
//!
//! `knowledge` turns the flattened Orphanet export into a frozen
//! [`knowledge::AssociationTable`]; `diagnosis` ranks disorders against a set of
//! present and absent symptoms in either `fast` or `true` mode.

pub mod config;
pub mod diagnosis;
pub mod error;
pub mod knowledge;
pub mod telemetry;
