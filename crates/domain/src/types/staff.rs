//! Staff member records derived from order associates

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STAFF_ROLE;

/// Sales associate, unique by trimmed display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
}

impl StaffMember {
    /// Active associate with the default role.
    pub fn associate(
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email,
            phone,
            role: DEFAULT_STAFF_ROLE.to_string(),
            is_active: true,
        }
    }
}
