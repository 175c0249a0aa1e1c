//! Page frames and the file header layout.
//!
//! A [`PageFrame`] is one cached page: the page bytes behind a read-write
//! lock plus atomic dirty and pin-count metadata. A [`PageGuard`] is a
//! scoped pin on a frame - acquiring one pins the page, dropping it
//! unpins, so a pinned page can never outlive its last user.

mod frame;
mod header;

pub use frame::{PageFrame, PageGuard};
pub use header::FileHeader;
