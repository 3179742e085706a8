//! Backend records consumed by the console
//!
//! The backend is inconsistent about identifier types (strings in some
//! endpoints, integers in others), so every id is normalized to a string.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
    UInt(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(i) => i.to_string(),
            RawId::UInt(u) => u.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }
    };
}

string_id!(
    /// Branch (location) identifier.
    BranchId
);
string_id!(
    /// Financial year identifier.
    FinancialYearId
);
string_id!(UserId);
string_id!(MenuId);

/// Deserialize an optional string that the backend may send as a number.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

/// Parse the date part of whatever timestamp shape the backend sends.
pub fn parse_backend_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn lenient_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_backend_date))
}

/// A branch the user may work in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: BranchId,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// An accounting period, carrying its time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialYear {
    pub year_id: FinancialYearId,
    #[serde(default)]
    pub year_code: String,
    #[serde(default, deserialize_with = "lenient_opt_date")]
    pub from_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_opt_date")]
    pub to_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub time_zone_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl FinancialYear {
    pub fn period(&self) -> Option<DatePeriod> {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) => Some(DatePeriod { from, to }),
            _ => None,
        }
    }
}

/// Closed date range of a financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DatePeriod {
    /// `MM/DD/YY - MM/DD/YY`, for narrow layouts.
    pub fn short_label(&self) -> String {
        format!("{} - {}", self.from.format("%m/%d/%y"), self.to.format("%m/%d/%y"))
    }
}

impl std::fmt::Display for DatePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.from.format("%b %d, %Y"),
            self.to.format("%b %d, %Y")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, rename = "profilePictureURL")]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_profile_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompanyDetails {
    /// Logo to show in the sidebar header, if the company has a usable one.
    pub fn logo_url(&self) -> Option<&str> {
        self.company_profile_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
