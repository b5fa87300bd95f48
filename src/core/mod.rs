pub mod category;
pub mod query;
pub mod record;
pub mod task;
pub mod urgency;
