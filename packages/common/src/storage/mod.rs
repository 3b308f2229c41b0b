mod error;
mod path;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use path::ObjectPath;
pub use traits::{BlobStore, WriteMode, join_public_url};
