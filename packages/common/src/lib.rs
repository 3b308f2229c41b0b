pub mod imaging;
pub mod storage;
pub mod viewport;

pub use imaging::{CompressOptions, Compressed, ImageError, ImageInfo};
pub use storage::{BlobStore, ObjectPath, StorageError, WriteMode};
pub use viewport::{Rect, Size, Viewport, ViewportError};
