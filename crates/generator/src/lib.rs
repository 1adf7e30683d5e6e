// Static document generation: metadata patching and script stripping

pub mod escape;
pub mod patch;
pub mod sanitize;

pub use patch::{LOCALE_MARKER_ID, MetadataField, patch_template};
pub use sanitize::{count_scripts, strip_scripts};
