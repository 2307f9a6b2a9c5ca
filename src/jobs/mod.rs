pub mod job;
pub mod stream;

pub use job::{JobAck, JobDeferred, PageJob, SNAPSHOT};
pub use stream::{JobEvent, StreamOptions, Subscription, subscribe};
