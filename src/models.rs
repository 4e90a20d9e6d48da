use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

pub type UserId = i64;
pub type PostingId = i64;
pub type ApplicationId = i64;
pub type ConversationId = i64;
pub type CompanyId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "company" => Ok(Role::Company),
            "admin" => Ok(Role::Admin),
            other => Err(ServiceError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// --- Postings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Draft,
    Pending,
    Active,
    Rejected,
    Closed,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Draft => "draft",
            PostingStatus::Pending => "pending",
            PostingStatus::Active => "active",
            PostingStatus::Rejected => "rejected",
            PostingStatus::Closed => "closed",
        }
    }

    /// Allowed moves of the posting workflow. Both the moderated path
    /// (draft -> pending -> active) and the direct company publish
    /// (draft -> active) are accepted.
    pub fn can_transition_to(self, next: PostingStatus) -> bool {
        use PostingStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Draft, Active)
                | (Pending, Active)
                | (Pending, Rejected)
                | (Rejected, Pending)
                | (Active, Closed)
        )
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub id: PostingId,
    pub title: String,
    pub company: String,
    pub company_id: Option<CompanyId>,
    pub location: String,
    pub duration: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: PostingStatus,
    pub created_at: DateTime<Utc>,
    pub applications_count: u32,
    pub salary: Option<String>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub missions: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub positions: u32,
}

/// Fields a company fills in when writing a new offer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPosting {
    pub title: String,
    pub location: String,
    pub duration: String,
    pub description: String,
    pub tags: Vec<String>,
    pub salary: Option<String>,
    pub start_date: Option<String>,
    pub missions: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub positions: Option<u32>,
}

/// How a company saves a new posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    Draft,
    Publish,
}

/// Admin verdict on a posting awaiting review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationDecision {
    Approved,
    Rejected,
}

impl ModerationDecision {
    pub fn target_status(self) -> PostingStatus {
        match self {
            ModerationDecision::Approved => PostingStatus::Active,
            ModerationDecision::Rejected => PostingStatus::Rejected,
        }
    }
}

// --- Applications ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A company's decision on a received application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationDecision {
    Accepted,
    Rejected,
}

impl From<ApplicationDecision> for ApplicationStatus {
    fn from(decision: ApplicationDecision) -> Self {
        match decision {
            ApplicationDecision::Accepted => ApplicationStatus::Accepted,
            ApplicationDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub education: Option<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub posting_id: PostingId,
    pub posting_title: String,
    pub applicant: Applicant,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub cover_letter: String,
}

// --- Profiles ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub bio: Option<String>,
    pub education: Option<String>,
    pub field: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub resume: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub profile_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub identity: Identity,
    pub profile: Profile,
}

/// Partial update of a user's identity and profile. `None` leaves the
/// current value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub education: Option<String>,
    pub field: Option<String>,
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub resume: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub sectors: Option<Vec<String>>,
    pub profile_completed: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.education.is_none()
            && self.field.is_none()
            && self.skills.is_none()
            && self.location.is_none()
            && self.avatar.is_none()
            && self.resume.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.sectors.is_none()
            && self.profile_completed.is_none()
    }
}

impl UserProfile {
    /// Shallow merge: every field present in `update` replaces the current
    /// value, every absent field is kept. Role, id and email never change.
    pub fn merge(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            name,
            bio,
            education,
            field,
            skills,
            location,
            avatar,
            resume,
            phone,
            website,
            sectors,
            profile_completed,
        } = update;

        if let Some(name) = name {
            self.identity.name = name;
        }
        let p = &mut self.profile;
        if bio.is_some() {
            p.bio = bio;
        }
        if education.is_some() {
            p.education = education;
        }
        if field.is_some() {
            p.field = field;
        }
        if let Some(skills) = skills {
            p.skills = skills;
        }
        if location.is_some() {
            p.location = location;
        }
        if avatar.is_some() {
            p.avatar = avatar;
        }
        if resume.is_some() {
            p.resume = resume;
        }
        if phone.is_some() {
            p.phone = phone;
        }
        if website.is_some() {
            p.website = website;
        }
        if let Some(sectors) = sectors {
            p.sectors = sectors;
        }
        if let Some(done) = profile_completed {
            p.profile_completed = done;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudentOnboarding {
    pub bio: String,
    pub education: String,
    pub field: String,
    pub skills: Vec<String>,
    pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyOnboarding {
    pub website: String,
    pub sectors: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub user_id: UserId,
    pub file_name: String,
    pub data: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

// --- Messaging ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Student,
    Company,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub student_id: UserId,
    pub company_id: Option<CompanyId>,
    pub student_name: String,
    pub company_name: String,
    pub posting_title: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn push(&mut self, message: Message) {
        self.last_message = message.text.clone();
        self.last_message_at = message.timestamp;
        self.messages.push(message);
    }
}

// --- Administration ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Pending,
    Verified,
    Suspended,
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            CompanyStatus::Pending => "pending",
            CompanyStatus::Verified => "verified",
            CompanyStatus::Suspended => "suspended",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub location: String,
    pub sectors: Vec<String>,
    pub employees_count: String,
    pub postings_count: u32,
    pub applications_count: u32,
    pub status: CompanyStatus,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: u32,
    pub student_count: u32,
    pub company_count: u32,
    pub admin_count: u32,
    pub new_users_this_month: u32,
    pub total_postings: u32,
    pub active_postings: u32,
    pub pending_postings: u32,
    pub total_companies: u32,
    pub active_companies: u32,
    pub total_applications: u32,
    pub applications_today: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    User,
    Posting,
    Application,
    Moderation,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::User => "user",
            ActivityKind::Posting => "posting",
            ActivityKind::Application => "application",
            ActivityKind::Moderation => "moderation",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Absent in snapshots written before admins could be suspended.
    #[serde(default)]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
}
