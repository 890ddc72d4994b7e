use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(CaseStatus {
    Pending => "pending",
    Completed => "completed",
    Urgent => "urgent",
});

str_enum!(CaseType {
    All => "all",
    My => "my",
    Unassigned => "unassigned",
});

str_enum!(ScanStatus {
    All => "all",
    FullyScanned => "fully_scanned",
    Pending => "pending",
});

// `LastWeek` spans one month and `LastMonth` six months; see `facets::dates`.
str_enum!(DateRangePreset {
    All => "all",
    Today => "today",
    Yesterday => "yesterday",
    LastWeek => "last_week",
    LastMonth => "last_month",
    From => "from",
});

str_enum!(FacetDimension {
    Site => "site",
    Sector => "sector",
    Doctor => "doctor",
});

str_enum!(FilterFlag {
    UrgentOnly => "urgent_only",
    NoImagesOnly => "no_images_only",
    CompletedSharesOnly => "completed_shares_only",
    UnseenImagesOnly => "unseen_images_only",
});

str_enum!(DateBound {
    From => "from",
    To => "to",
});

str_enum!(SortOrder {
    NewestFirst => "newest_first",
    OldestFirst => "oldest_first",
});

impl Default for CaseType {
    fn default() -> Self {
        Self::All
    }
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self::All
    }
}

impl Default for DateRangePreset {
    fn default() -> Self {
        Self::All
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::NewestFirst
    }
}

impl SortOrder {
    /// The opposite order, for the inbox header's sort button.
    pub fn toggle(self) -> Self {
        match self {
            Self::NewestFirst => Self::OldestFirst,
            Self::OldestFirst => Self::NewestFirst,
        }
    }
}
