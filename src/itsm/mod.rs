// ABOUTME: Client for the ITSM change-management REST API.
// ABOUTME: Change requests, change tasks, and incidents.

pub mod client;
pub mod error;
pub mod model;

pub use client::{ChangeLookup, Client, ListQuery};
pub use error::ItsmError;
pub use model::{
    ChangeKind, NewChangeRequest, NewChangeTask, RECORD_FIELDS, Record, Table, UnknownTable,
};
