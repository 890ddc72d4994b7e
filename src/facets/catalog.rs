//! Registered facet values: sites, sectors (each owned by one site) and
//! doctors (each optionally affiliated with a site).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{User, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorEntry {
    pub name: String,
    pub site: String,
}

impl SectorEntry {
    pub fn new(name: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site: site.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorEntry {
    pub id: UserId,
    pub name: String,
    pub site: Option<String>,
}

impl From<&User> for DoctorEntry {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            site: user.site.clone(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Site registered twice: {0}")]
    DuplicateSite(String),

    #[error("Sector registered twice: {0}")]
    DuplicateSector(String),

    #[error("Doctor registered twice: {0}")]
    DuplicateDoctor(UserId),

    #[error("Sector {sector} belongs to unregistered site {site}")]
    UnknownSectorSite { sector: String, site: String },
}

/// Read-only facet definitions. Option order in the panel follows
/// registration order.
///
/// Deserializing runs the same checks as `new`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct FacetCatalog {
    sites: Vec<String>,
    sectors: Vec<SectorEntry>,
    doctors: Vec<DoctorEntry>,
}

#[derive(Deserialize)]
struct RawCatalog {
    sites: Vec<String>,
    sectors: Vec<SectorEntry>,
    doctors: Vec<DoctorEntry>,
}

impl TryFrom<RawCatalog> for FacetCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.sites, raw.sectors, raw.doctors)
    }
}

impl FacetCatalog {
    pub fn new(
        sites: Vec<String>,
        sectors: Vec<SectorEntry>,
        doctors: Vec<DoctorEntry>,
    ) -> Result<Self, CatalogError> {
        validate_sites_and_sectors(&sites, &sectors)?;
        let catalog = Self {
            sites,
            sectors,
            doctors: Vec::new(),
        };
        catalog.with_doctors(doctors)
    }

    /// Replace the doctor dimension, e.g. after the user directory refreshed.
    pub fn with_doctors(mut self, doctors: Vec<DoctorEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for doctor in &doctors {
            if !seen.insert(doctor.id) {
                return Err(CatalogError::DuplicateDoctor(doctor.id));
            }
        }
        self.doctors = doctors;
        Ok(self)
    }

    pub fn with_doctors_from_users(self, users: &[User]) -> Result<Self, CatalogError> {
        self.with_doctors(users.iter().map(DoctorEntry::from).collect())
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn sectors(&self) -> &[SectorEntry] {
        &self.sectors
    }

    pub fn doctors(&self) -> &[DoctorEntry] {
        &self.doctors
    }

    pub fn has_site(&self, name: &str) -> bool {
        self.sites.iter().any(|s| s == name)
    }

    pub fn has_sector(&self, name: &str) -> bool {
        self.sectors.iter().any(|s| s.name == name)
    }

    pub fn has_doctor(&self, id: UserId) -> bool {
        self.doctors.iter().any(|d| d.id == id)
    }

    /// The site owning a sector, if the sector is registered.
    pub fn sector_site(&self, sector: &str) -> Option<&str> {
        self.sectors
            .iter()
            .find(|s| s.name == sector)
            .map(|s| s.site.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty() && self.sectors.is_empty() && self.doctors.is_empty()
    }
}

fn validate_sites_and_sectors(sites: &[String], sectors: &[SectorEntry]) -> Result<(), CatalogError> {
    let mut seen_sites = HashSet::new();
    for site in sites {
        if !seen_sites.insert(site.as_str()) {
            return Err(CatalogError::DuplicateSite(site.clone()));
        }
    }

    let mut seen_sectors = HashSet::new();
    for sector in sectors {
        if !seen_sectors.insert(sector.name.as_str()) {
            return Err(CatalogError::DuplicateSector(sector.name.clone()));
        }
        if !seen_sites.contains(sector.site.as_str()) {
            return Err(CatalogError::UnknownSectorSite {
                sector: sector.name.clone(),
                site: sector.site.clone(),
            });
        }
    }
    Ok(())
}
