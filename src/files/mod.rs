pub mod detect;
pub mod store;

pub use detect::{extension_for, sniff_mime};
pub use store::FileStore;
