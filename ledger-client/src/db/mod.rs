pub mod event_queries;
pub mod record_queries;
