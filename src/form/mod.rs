pub mod condition;
pub mod form_model;
pub mod ingest;
