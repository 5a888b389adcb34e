pub mod entry;
pub mod list;

pub use entry::{NewEntry, RecordId, VocabEntry};
pub use list::{BOOKMARKS, ListName, ListTarget, NameError};
