//! Incremental Fetch Pipeline
//!
//! Session state and the pagination streams that feed the card aggregators.

pub mod paginator;
pub mod session;

pub use paginator::{follow_cached, paginate, PageStream, PaginationStream};
pub use session::{LoadSession, SessionPhase, SessionSnapshot};
