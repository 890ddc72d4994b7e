use serde::{Deserialize, Serialize};

use super::case::UserId;

/// A member of staff from the user directory. Doctors in the facet panel
/// are drawn from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub specialty: String,
    pub site: Option<String>,
}

/// A user before the directory has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub specialty: String,
    pub site: Option<String>,
}

impl NewUser {
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            specialty: self.specialty,
            site: self.site,
        }
    }
}

/// Partial update: `None` leaves a field as it is. `site: Some(None)`
/// clears the affiliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub site: Option<Option<String>>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(specialty) = self.specialty {
            user.specialty = specialty;
        }
        if let Some(site) = self.site {
            user.site = site;
        }
    }
}
