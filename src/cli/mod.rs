pub mod doctor;
pub mod ingest;
pub mod maintenance;
pub mod search;
pub mod stats;
