//! Repository traits for metadata operations.

pub mod procedures;
pub mod snapshots;
pub mod tables;

pub use procedures::ProcedureRepo;
pub use snapshots::SnapshotRepo;
pub use tables::TableRepo;
