//! Form domain layer
//!
//! Value objects, field addressing, the error map and the [`FormSession`]
//! store that owns the runtime state of one rendered section.

mod errors;
mod field;
mod form_state;
mod path;
mod previews;

pub use errors::{ErrorEntry, FieldError, FormErrors, GroupErrors};
pub use field::{FileHandle, FileValue, Group, Value, Values};
pub use form_state::{FormSession, InitialData, DROPDOWN_NONE};
pub use path::{FieldPath, GroupSlot};
pub use previews::PreviewCache;
