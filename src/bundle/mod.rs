mod enumerate;
mod roles;

pub use enumerate::{enumerate, ComponentFile};
pub use roles::{classify_member, ComponentKind, FileRole, DESCRIPTOR_PRIORITY, UNMATCHED_PRIORITY};
