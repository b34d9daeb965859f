//! Wire enums shared by submissions, events and validation issues
//!
//! Every enum here is persisted as its integer value and accepted on the
//! wire either as that integer or as its variant name (case-insensitive).
//! Responses carry the variant name.

use crate::error::EprError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Persisted integer value
            pub fn value(self) -> i32 {
                self as i32
            }

            /// Variant name as used on the wire
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            pub fn from_value(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(name))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EprError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(value) => Self::from_value(value),
                    Err(_) => Self::from_name(s),
                }
                .ok_or_else(|| EprError::unknown_variant(stringify!($name), s))
            }
        }

        impl TryFrom<i32> for $name {
            type Error = EprError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::from_value(i64::from(value))
                    .ok_or_else(|| EprError::unknown_variant(stringify!($name), value))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct WireVisitor;

                impl serde::de::Visitor<'_> for WireVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        write!(f, "a {} name or integer value", stringify!($name))
                    }

                    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<$name, E> {
                        $name::from_value(v).ok_or_else(|| {
                            E::custom(EprError::unknown_variant(stringify!($name), v))
                        })
                    }

                    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<$name, E> {
                        let v = i64::try_from(v).map_err(E::custom)?;
                        self.visit_i64(v)
                    }

                    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<$name, E> {
                        v.parse().map_err(E::custom)
                    }
                }

                deserializer.deserialize_any(WireVisitor)
            }
        }
    };
}

wire_enum! {
    /// Kind of data being submitted
    pub enum SubmissionType {
        Producer = 1,
        Registration = 2,
        Subsidiary = 3,
        CompaniesHouse = 4,
        Accreditation = 5,
    }
}

wire_enum! {
    /// Channel through which submission data arrives
    pub enum DataSourceType {
        File = 1,
    }
}

wire_enum! {
    /// Discriminator of every submission event
    pub enum EventType {
        AntivirusCheck = 1,
        CheckSplitter = 2,
        ProducerValidation = 3,
        Submitted = 4,
        AntivirusResult = 5,
        RegistrationValidation = 6,
        RegulatorPoMDecision = 7,
        BrandValidation = 8,
        PartnerValidation = 9,
        RegulatorRegistrationDecision = 10,
        FileDownloadCheck = 11,
        RegistrationFeePayment = 12,
        RegistrationApplicationSubmitted = 13,
        PackagingResubmissionFeePayment = 14,
        PackagingResubmissionApplicationSubmitted = 15,
    }
}

wire_enum! {
    /// Type of an uploaded file
    pub enum FileType {
        Pom = 1,
        CompanyDetails = 2,
        Brands = 3,
        Partnerships = 4,
        Subsidiaries = 5,
        CompaniesHouse = 6,
        Accreditation = 7,
    }
}

wire_enum! {
    /// Outcome of an antivirus scan
    pub enum AntivirusScanResult {
        AwaitingProcessing = 1,
        Success = 2,
        Quarantined = 3,
        FailedToVirusScan = 4,
    }
}

wire_enum! {
    /// What caused an antivirus scan to run
    pub enum AntivirusScanTrigger {
        Upload = 1,
        Download = 2,
    }
}

wire_enum! {
    /// Regulator decision on a submitted file
    pub enum RegulatorDecision {
        None = 0,
        Accepted = 1,
        Rejected = 2,
        Approved = 3,
        Cancelled = 4,
        Queried = 5,
    }
}

wire_enum! {
    /// Discriminator of validation errors and warnings
    pub enum ValidationType {
        Producer = 1,
        Registration = 2,
        CheckSplitter = 3,
    }
}

impl EventType {
    /// Whether events of this type carry a validation payload
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            EventType::CheckSplitter
                | EventType::ProducerValidation
                | EventType::RegistrationValidation
                | EventType::BrandValidation
                | EventType::PartnerValidation
        )
    }
}

impl RegulatorDecision {
    /// Decisions that must be accompanied by regulator comments
    pub fn requires_comments(self) -> bool {
        matches!(
            self,
            RegulatorDecision::Rejected | RegulatorDecision::Cancelled | RegulatorDecision::Queried
        )
    }
}
