//! Demonstration data set: four hospital sites, ten staff, sixteen cases.
//!
//! Case dates are laid out one day apart going back from `now`, so date
//! presets have something to bite on whenever the demo runs.

use chrono::{DateTime, Duration, Utc};

use crate::facets::{CatalogError, FacetCatalog, SectorEntry};
use crate::models::*;

pub const DEMO_SITES: &[&str] = &["CHU-Angers", "CHU-Caen", "CHU-Brest", "Remote site"];

/// (sector, owning site)
pub const DEMO_SECTORS: &[(&str, &str)] = &[
    ("Colon", "CHU-Angers"),
    ("Cytologie", "CHU-Angers"),
    ("Florescence", "CHU-Angers"),
    ("Throat", "CHU-Caen"),
    ("Oncology", "CHU-Caen"),
    ("General", "CHU-Caen"),
    ("Lungs", "CHU-Brest"),
    ("Chest", "CHU-Brest"),
    ("Breast", "CHU-Brest"),
    ("Histologie", "CHU-Brest"),
];

/// The user the demo inbox is opened as.
pub const DEMO_CURRENT_USER: UserId = 1;

pub fn demo_users() -> Vec<User> {
    [
        (1, "Damien", "Oncologue", "CHU-Angers"),
        (2, "Nicolas", "Oncologue", "CHU-Caen"),
        (3, "Déborah", "Pédiatre", "CHU-Angers"),
        (4, "Daniel", "Radiographer", "CHU-Caen"),
        (5, "Sylvie", "Médecin généraliste", "CHU-Caen"),
        (6, "Claire", "Cardiologue", "CHU-Brest"),
        (7, "Julien", "Urgentiste", "CHU-Brest"),
        (8, "Fatima", "Neurologue", "CHU-Brest"),
        (9, "Thomas", "Chirurgien orthopédique", "CHU-Angers"),
        (10, "Marie", "Infirmière en chef", "Remote site"),
    ]
    .into_iter()
    .map(|(id, name, specialty, site)| User {
        id,
        name: name.into(),
        specialty: specialty.into(),
        site: Some(site.into()),
    })
    .collect()
}

pub fn demo_cases(now: DateTime<Utc>) -> Vec<Case> {
    use CaseStatus::*;

    // (id, title, doctor, site, sector, status, scanned, unseen, fully_scanned, shares)
    let rows: [(CaseId, &str, UserId, &str, &str, CaseStatus, bool, bool, bool, bool); 16] = [
        (1, "Case #001 - Colon Analysis", 1, "CHU-Angers", "Colon", Pending, true, false, true, false),
        (2, "Case #002 - Cytologie Review", 3, "CHU-Angers", "Cytologie", Pending, true, false, true, false),
        (3, "Case #003 - Florescence Study", 9, "CHU-Angers", "Florescence", Pending, true, false, true, false),
        (4, "Case #004 - Throat Examination", 4, "CHU-Caen", "Throat", Urgent, false, true, false, true),
        (5, "Case #005 - Oncology Review", 2, "CHU-Caen", "Oncology", Completed, true, false, true, true),
        (6, "Case #006 - General Medicine", 5, "CHU-Caen", "General", Pending, false, false, false, false),
        (7, "Case #007 - Lungs Analysis", 6, "CHU-Brest", "Lungs", Pending, true, true, false, false),
        (8, "Case #008 - Chest X-ray Analysis", 7, "CHU-Brest", "Chest", Urgent, false, false, false, false),
        (9, "Case #009 - Breast Screening", 6, "CHU-Brest", "Breast", Completed, true, false, true, true),
        (10, "Case #010 - Histologie Analysis", 8, "CHU-Brest", "Histologie", Completed, true, false, true, true),
        (11, "Case #011 - Remote Care", 10, "Remote site", "General", Pending, false, true, false, false),
        (12, "Case #012 - Colon Follow-up", 1, "CHU-Angers", "Colon", Completed, true, false, true, true),
        (13, "Case #013 - Cytologie Screening", 1, "CHU-Angers", "Cytologie", Urgent, true, true, false, false),
        (14, "Case #014 - Florescence Research", 1, "CHU-Angers", "Florescence", Pending, false, false, false, false),
        (15, "Case #015 - General Radiology", 4, "CHU-Caen", "General", Pending, true, false, true, false),
        (16, "Case #016 - Oncology Imaging", 4, "CHU-Caen", "Oncology", Completed, true, false, true, true),
    ];

    rows.into_iter()
        .map(
            |(id, title, doctor, site, sector, status, scanned, unseen, fully, shares)| Case {
                id,
                title: title.into(),
                assigned_doctor_id: Some(doctor),
                site: site.into(),
                sector: sector.into(),
                date: now - Duration::days(id - 1),
                status,
                is_scanned: scanned,
                has_unseen_images: unseen,
                is_fully_scanned: fully,
                has_shares: shares,
            },
        )
        .collect()
}

/// Sites and sectors of the demo set, doctors from `demo_users`.
pub fn demo_catalog() -> Result<FacetCatalog, CatalogError> {
    FacetCatalog::new(
        DEMO_SITES.iter().map(|s| s.to_string()).collect(),
        DEMO_SECTORS
            .iter()
            .map(|(name, site)| SectorEntry::new(*name, *site))
            .collect(),
        Vec::new(),
    )?
    .with_doctors_from_users(&demo_users())
}
