//! Workload directory naming.

use uuid::{Uuid, Variant};

/// True for a canonical lowercase hyphenated version-4 UUID, e.g.
/// `a1b2c3d4-e5f6-4789-8abc-def012345678`.
pub fn is_workload_directory_name(name: &str) -> bool {
    if name.len() != 36 {
        return false;
    }
    match Uuid::try_parse(name) {
        Ok(id) => {
            id.get_version_num() == 4
                && id.get_variant() == Variant::RFC4122
                && id.hyphenated().to_string() == name
        }
        Err(_) => false,
    }
}
