//! # Hindsight Sessions
//!
//! Everything between the session store on disk and the context assembler:
//! the sidecar index, candidate discovery across storage layouts, the
//! transcript parser, and the bounded concurrent loader.

pub mod discovery;
pub mod index;
pub mod loader;
pub mod parser;

pub use discovery::{discover, find_sessions_root};
pub use index::{load as load_index, resolved_timestamp, INDEX_FILE_NAME};
pub use loader::{load_all, LoadedSession, MAX_CONCURRENT_READS};
pub use parser::{parse, render};
