use serde::{Deserialize, Serialize};

use crate::models::{CaseId, UserId};

/// One selectable site in the panel, with its live count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    pub name: String,
    pub count: usize,
    pub selected: bool,
}

/// A sector option carries the site that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorOption {
    pub name: String,
    pub site: String,
    pub count: usize,
    pub selected: bool,
}

/// A doctor option; `id` joins against `Case::assigned_doctor_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorOption {
    pub id: UserId,
    pub name: String,
    pub site: Option<String>,
    pub count: usize,
    pub selected: bool,
}

/// Everything the facet panel renders after one recompute pass.
///
/// Rebuilt wholesale on every selection change; nothing in here has
/// identity across passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetView {
    pub sites: Vec<FacetOption>,
    pub sectors: Vec<SectorOption>,
    pub doctors: Vec<DoctorOption>,
    /// Ids of the filtered case subset, in collection order.
    pub case_ids: Vec<CaseId>,
    pub total: usize,
    /// Filtered cases whose site or sector is not registered in the catalog.
    pub unattributed: usize,
}

impl FacetView {
    pub fn site(&self, name: &str) -> Option<&FacetOption> {
        self.sites.iter().find(|o| o.name == name)
    }

    pub fn sector(&self, name: &str) -> Option<&SectorOption> {
        self.sectors.iter().find(|o| o.name == name)
    }

    pub fn doctor(&self, id: UserId) -> Option<&DoctorOption> {
        self.doctors.iter().find(|o| o.id == id)
    }

    pub fn site_names(&self) -> Vec<&str> {
        self.sites.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn doctor_ids(&self) -> Vec<UserId> {
        self.doctors.iter().map(|o| o.id).collect()
    }
}
