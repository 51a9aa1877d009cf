mod error;
mod store;

pub use error::LifecycleError;
pub use store::{CreatedTest, ResolvedTest, TestStore};
