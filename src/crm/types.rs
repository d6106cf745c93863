/// Admissions CRM record types
///
/// Centers, students and inquiries as stored in SQLite and returned by the
/// JSON API. Enumerated columns are stored as their SCREAMING_SNAKE_CASE
/// names.

use crate::crm::CrmError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pipeline state of an inquiry
///
/// NEW -> FOLLOW_UP -> QUALIFIED -> CONVERTED, with LOST reachable from any
/// open state. CONVERTED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    New,
    FollowUp,
    Qualified,
    Converted,
    Lost,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 5] = [
        InquiryStatus::New,
        InquiryStatus::FollowUp,
        InquiryStatus::Qualified,
        InquiryStatus::Converted,
        InquiryStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "NEW",
            InquiryStatus::FollowUp => "FOLLOW_UP",
            InquiryStatus::Qualified => "QUALIFIED",
            InquiryStatus::Converted => "CONVERTED",
            InquiryStatus::Lost => "LOST",
        }
    }
}

/// Enrollment state of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    Inquiry,
    Enrolled,
    Active,
    Completed,
    Dropped,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 5] = [
        StudentStatus::Inquiry,
        StudentStatus::Enrolled,
        StudentStatus::Active,
        StudentStatus::Completed,
        StudentStatus::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Inquiry => "INQUIRY",
            StudentStatus::Enrolled => "ENROLLED",
            StudentStatus::Active => "ACTIVE",
            StudentStatus::Completed => "COMPLETED",
            StudentStatus::Dropped => "DROPPED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

macro_rules! impl_from_str {
    ($ty:ty, $label:literal) => {
        impl FromStr for $ty {
            type Err = CrmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CrmError::Validation(format!("Invalid {}: '{}'", $label, s)))
            }
        }
    };
}

impl_from_str!(InquiryStatus, "inquiry status");
impl_from_str!(StudentStatus, "student status");
impl_from_str!(Priority, "priority");

/// A training center (branch)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    pub id: String,
    pub name: String,
    pub code: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub center_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: StudentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A prospective-student record in the admissions pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: String,
    pub student_id: String,
    pub center_id: String,
    pub course_interest: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub status: InquiryStatus,
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
}

/// Inquiry with its student and center attached, as shown to staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InquiryDetails {
    #[serde(flatten)]
    pub inquiry: Inquiry,
    pub student: Student,
    pub center: Center,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCenter {
    pub id: Option<String>,
    pub name: String,
    pub code: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub id: Option<String>,
    pub center_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInquiry {
    pub id: Option<String>,
    pub student_id: String,
    pub course_interest: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
}

/// Validated status/priority change for one inquiry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InquiryUpdate {
    pub status: Option<InquiryStatus>,
    pub priority: Option<Priority>,
}

impl InquiryUpdate {
    /// Parse raw request values; fails before any storage work happens
    pub fn parse(status: Option<&str>, priority: Option<&str>) -> Result<Self, CrmError> {
        let update = Self {
            status: status.map(str::parse).transpose()?,
            priority: priority.map(str::parse).transpose()?,
        };

        if update.status.is_none() && update.priority.is_none() {
            return Err(CrmError::Validation(
                "Update must include a status or a priority".to_string(),
            ));
        }

        Ok(update)
    }
}

/// Inquiry counts per pipeline state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InquiryStats {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: InquiryStatus,
    pub count: i64,
}

/// Current time in the format stored in `created_at`/`updated_at`
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Fresh record identifier with a readable prefix, e.g. `STU-...`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
