//! ディレクトリリスティング
//!
//! エントリの固定幅表現と、ディレクトリ単位のスナップショット

pub mod buffer;
pub mod entry;
pub mod mode;

pub use buffer::{ListingBuffer, ListingOptions};
pub use entry::{Entry, EntryKind, ModifiedAt, NAME_COLUMN};
pub use mode::mode_string;
