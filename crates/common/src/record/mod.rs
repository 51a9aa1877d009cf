mod artifact;
mod member;
mod metadata;

pub use artifact::{Artifact, Headers};
pub use member::Member;
pub use metadata::{Metadata, RecordError};
