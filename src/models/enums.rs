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
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

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

// Declaration order is the registry's display order.
str_enum!(ParameterKey {
    Hba1c => "hba1c",
    Glucose => "glucose",
    Triglycerides => "triglycerides",
    Hdl => "hdl",
    Ldl => "ldl",
    TotalCholesterol => "total_cholesterol",
    Hemoglobin => "hemoglobin",
    Creatinine => "creatinine",
    Tsh => "tsh",
    VitaminD => "vitamin_d",
    Wbc => "wbc",
    Platelets => "platelets",
    UricAcid => "uric_acid",
    Alt => "alt",
    Ast => "ast",
});

str_enum!(ReportSource {
    Pdf => "pdf",
    Manual => "manual",
});

str_enum!(LabStatus {
    None => "none",
    Normal => "normal",
    Warning => "warning",
    High => "high",
});

impl LabStatus {
    /// Label shown next to a value.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Borderline",
            Self::High => "Abnormal",
            Self::None => "—",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Normal => "#22c55e",
            Self::Warning => "#f59e0b",
            Self::High => "#ef4444",
            Self::None => "#334155",
        }
    }
}

str_enum!(Trend {
    Up => "up",
    Down => "down",
    Flat => "flat",
});

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "→",
        }
    }
}
