pub mod persist;
pub mod source;

pub use persist::{DirectoryPersist, Persist, format_filename};
pub use source::{FileSources, SourceProvider, TextSources};
