pub mod s3_event;

pub use s3_event::{NotificationError, parse_s3_event};
