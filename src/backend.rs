//! In-process simulated backend.
//!
//! Every call sleeps for the configured latency, then reads or mutates a
//! seeded in-memory state. Account registries and self-registered company
//! rows are written through to local storage so sign-ups and administrator
//! accounts survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::auth::{TokenSigner, hash_password, verify_password};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::filter::PostingFilter;
use crate::models::*;
use crate::persist::Persisted;
use crate::seed;
use crate::service::*;
use crate::validate;

/// Server-side view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    pub identity: Identity,
    pub password_hash: String,
    #[serde(default)]
    pub profile: Profile,
    pub status: UserStatus,
    pub company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
}

impl StoredAccount {
    pub fn applicant(&self) -> Applicant {
        Applicant {
            id: self.identity.id,
            name: self.identity.name.clone(),
            email: self.identity.email.clone(),
            education: self.profile.education.clone(),
            skills: self.profile.skills.clone(),
        }
    }

    pub fn user_profile(&self) -> UserProfile {
        UserProfile {
            identity: self.identity.clone(),
            profile: self.profile.clone(),
        }
    }

    fn record(&self) -> UserRecord {
        UserRecord {
            id: self.identity.id,
            name: self.identity.name.clone(),
            email: self.identity.email.clone(),
            role: self.identity.role,
            status: self.status,
            created_at: self.created_at,
        }
    }

    fn from_admin(admin: &AdminAccount) -> Self {
        Self {
            identity: Identity {
                id: admin.id,
                name: admin.name.clone(),
                email: admin.email.clone(),
                role: Role::Admin,
            },
            password_hash: admin.password_hash.clone(),
            profile: Profile::default(),
            status: admin.status,
            company_id: None,
            created_at: admin.created_at,
        }
    }
}

struct State {
    accounts: Vec<StoredAccount>,
    /// Administrator accounts added from the admin console.
    admins: Vec<AdminAccount>,
    postings: Vec<Posting>,
    applications: Vec<Application>,
    companies: Vec<Company>,
    conversations: Vec<Conversation>,
    activities: Vec<Activity>,
    next_id: i64,
}

const ID_FLOOR: i64 = 1000;
const MAX_ACTIVITIES: usize = 50;

/// Row created for a company that registers itself. Awaits verification.
fn registered_company(id: CompanyId, name: &str, email: &str, created_at: DateTime<Utc>) -> Company {
    Company {
        id,
        name: name.to_string(),
        location: String::new(),
        sectors: Vec::new(),
        employees_count: String::new(),
        postings_count: 0,
        applications_count: 0,
        status: CompanyStatus::Pending,
        email: email.to_string(),
        phone: None,
        website: None,
        description: String::new(),
        created_at,
    }
}

impl State {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn account(&self, id: UserId) -> Option<&StoredAccount> {
        self.accounts.iter().find(|a| a.identity.id == id)
    }

    fn account_mut(&mut self, id: UserId) -> Option<&mut StoredAccount> {
        self.accounts.iter_mut().find(|a| a.identity.id == id)
    }

    fn account_by_email(&self, email: &str) -> Option<&StoredAccount> {
        self.accounts
            .iter()
            .find(|a| a.identity.email.eq_ignore_ascii_case(email.trim()))
    }

    fn log(&mut self, kind: ActivityKind, message: String) {
        self.activities.insert(
            0,
            Activity {
                kind,
                message,
                timestamp: Utc::now(),
            },
        );
        self.activities.truncate(MAX_ACTIVITIES);
    }

    fn applications_for(&self, posting_id: PostingId) -> u32 {
        self.applications
            .iter()
            .filter(|a| a.posting_id == posting_id && a.status != ApplicationStatus::Withdrawn)
            .count() as u32
    }

    /// Postings leave the backend with their application count recomputed.
    fn counted(&self, posting: &Posting) -> Posting {
        let mut posting = posting.clone();
        posting.applications_count = self.applications_for(posting.id);
        posting
    }

    fn company_status(&self, id: Option<CompanyId>) -> Option<CompanyStatus> {
        let id = id?;
        self.companies.iter().find(|c| c.id == id).map(|c| c.status)
    }

    fn visible_in_catalog(&self, posting: &Posting) -> bool {
        posting.status == PostingStatus::Active
            && self.company_status(posting.company_id) != Some(CompanyStatus::Suspended)
    }

    fn posting_index(&self, id: PostingId) -> Result<usize> {
        self.postings
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ServiceError::not_found("Posting", id))
    }

    fn counted_company(&self, company: &Company) -> Company {
        let mut company = company.clone();
        let ids: Vec<PostingId> = self
            .postings
            .iter()
            .filter(|p| p.company_id == Some(company.id))
            .map(|p| p.id)
            .collect();
        company.postings_count = ids.len() as u32;
        company.applications_count = ids.iter().map(|id| self.applications_for(*id)).sum();
        company
    }

    /// Accounts that live in the `accounts` key; console admins are kept
    /// separately in `admins`.
    fn registry(&self) -> Vec<StoredAccount> {
        self.accounts
            .iter()
            .filter(|a| !self.admins.iter().any(|admin| admin.id == a.identity.id))
            .cloned()
            .collect()
    }

    /// Company rows that live in the `companies` key. Seeded ids sit below
    /// the id floor and are rebuilt on every start.
    fn registered_companies(&self) -> Vec<Company> {
        self.companies
            .iter()
            .filter(|c| c.id >= ID_FLOOR)
            .cloned()
            .collect()
    }

    /// Restores company rows for registered company accounts, including
    /// accounts saved before their row was persisted.
    fn restore_companies(&mut self, saved: Vec<Company>, now: DateTime<Utc>) {
        for company in saved {
            if !self.companies.iter().any(|c| c.id == company.id) {
                self.companies.push(company);
            }
        }
        let orphans: Vec<Company> = self
            .accounts
            .iter()
            .filter(|a| a.identity.role == Role::Company)
            .filter_map(|a| {
                let id = a.company_id?;
                let known = self.companies.iter().any(|c| c.id == id);
                (!known).then(|| registered_company(id, &a.identity.name, &a.identity.email, now))
            })
            .collect();
        self.companies.extend(orphans);
    }
}

pub struct MockBackend {
    state: Mutex<State>,
    latency: std::time::Duration,
    signer: TokenSigner,
    persisted: Persisted,
    publish_requires_review: bool,
}

impl MockBackend {
    pub fn new(config: &Config, persisted: Persisted) -> Result<Self> {
        let now = Utc::now();
        let admins = persisted.load_admins()?;
        let mut accounts = persisted.load_accounts()?;
        if accounts.is_empty() {
            accounts = seed::accounts(now);
        }
        accounts.extend(admins.iter().map(StoredAccount::from_admin));

        let mut state = State {
            accounts,
            admins,
            postings: seed::postings(now),
            applications: Vec::new(),
            companies: seed::companies(now),
            conversations: seed::conversations(now),
            activities: seed::activities(now),
            next_id: ID_FLOOR,
        };
        state.restore_companies(persisted.load_companies()?, now);
        state.applications = seed::applications(now, &state.accounts);
        state.next_id = state
            .accounts
            .iter()
            .flat_map(|a| [Some(a.identity.id), a.company_id])
            .flatten()
            .chain(state.companies.iter().map(|c| c.id))
            .max()
            .map_or(ID_FLOOR, |max| (max + 1).max(ID_FLOOR));

        tracing::debug!(
            accounts = state.accounts.len(),
            companies = state.companies.len(),
            postings = state.postings.len(),
            "backend seeded"
        );

        Ok(Self {
            state: Mutex::new(state),
            latency: config.latency,
            signer: TokenSigner::new(&config.secret),
            persisted,
            publish_requires_review: config.publish_requires_review,
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate(&self, operation: &'static str) {
        tracing::debug!(operation, latency_ms = self.latency.as_millis() as u64, "simulated call");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Resolves the bearer of `token` against the live registry. The role is
    /// taken from the account, and must still match the signed claim.
    fn authorize(&self, state: &State, token: &str, role: Option<Role>) -> Result<Identity> {
        let claim = self.signer.verify(token)?;
        let account = state
            .account(claim.user_id)
            .ok_or(ServiceError::Unauthenticated)?;
        if account.identity.role != claim.role {
            return Err(ServiceError::Unauthenticated);
        }
        if account.status == UserStatus::Suspended {
            return Err(ServiceError::Forbidden);
        }
        if let Some(required) = role {
            if account.identity.role != required {
                return Err(ServiceError::Forbidden);
            }
        }
        Ok(account.identity.clone())
    }

    fn company_of(&self, state: &State, identity: &Identity) -> Result<CompanyId> {
        state
            .account(identity.id)
            .and_then(|a| a.company_id)
            .ok_or_else(|| ServiceError::not_found("Company for user", identity.id))
    }

    fn persist_registry(&self, state: &State) -> Result<()> {
        self.persisted.save_accounts(&state.registry())
    }

    fn persist_companies(&self, state: &State) -> Result<()> {
        self.persisted.save_companies(&state.registered_companies())
    }

    fn grant(&self, identity: Identity) -> Result<SessionGrant> {
        let token = self.signer.issue(identity.id, identity.role)?;
        Ok(SessionGrant { token, identity })
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionGrant> {
        validate::credentials(email, password)?;
        self.simulate("sign_in").await;

        let state = self.state();
        let account = state
            .account_by_email(email)
            .filter(|a| verify_password(password, &a.password_hash))
            .ok_or(ServiceError::InvalidCredentials)?;
        if account.status == UserStatus::Suspended {
            return Err(ServiceError::Forbidden);
        }

        tracing::info!(user_id = account.identity.id, role = %account.identity.role, "signed in");
        self.grant(account.identity.clone())
    }

    async fn sign_up(&self, form: &SignUpForm) -> Result<SessionGrant> {
        validate::sign_up(form)?;
        let role = form.role.unwrap_or(Role::Student);
        if role == Role::Admin {
            return Err(ServiceError::Forbidden);
        }
        self.simulate("sign_up").await;

        let mut state = self.state();
        if state.account_by_email(&form.email).is_some() {
            return Err(ServiceError::conflict("This email is already registered"));
        }

        let now = Utc::now();
        let id = state.next_id();
        let name = form.name.trim().to_string();
        let company_id = if role == Role::Company {
            let company_id = state.next_id();
            state
                .companies
                .push(registered_company(company_id, &name, form.email.trim(), now));
            Some(company_id)
        } else {
            None
        };

        let account = StoredAccount {
            identity: Identity {
                id,
                name: name.clone(),
                email: form.email.trim().to_string(),
                role,
            },
            password_hash: hash_password(&form.password),
            profile: Profile::default(),
            status: UserStatus::Active,
            company_id,
            created_at: now,
        };
        let identity = account.identity.clone();
        state.accounts.push(account);
        state.log(ActivityKind::User, format!("New user registered: {}", name));
        self.persist_registry(&state)?;
        if company_id.is_some() {
            self.persist_companies(&state)?;
        }

        tracing::info!(user_id = id, role = %role, "account registered");
        self.grant(identity)
    }

    async fn sign_out(&self, _token: &str) -> Result<()> {
        self.simulate("sign_out").await;
        Ok(())
    }
}

#[async_trait]
impl CatalogService for MockBackend {
    async fn list_postings(&self, filter: &PostingFilter) -> Result<Vec<Posting>> {
        self.simulate("list_postings").await;
        let state = self.state();
        let visible: Vec<Posting> = state
            .postings
            .iter()
            .filter(|p| state.visible_in_catalog(p))
            .map(|p| state.counted(p))
            .collect();
        Ok(filter.apply(&visible))
    }

    async fn get_posting(&self, id: PostingId) -> Result<Posting> {
        self.simulate("get_posting").await;
        let state = self.state();
        state
            .postings
            .iter()
            .find(|p| p.id == id && state.visible_in_catalog(p))
            .map(|p| state.counted(p))
            .ok_or_else(|| ServiceError::not_found("Posting", id))
    }

    async fn apply(
        &self,
        token: &str,
        posting_id: PostingId,
        form: &ApplicationForm,
    ) -> Result<Application> {
        if form.cover_letter.trim().is_empty() {
            return Err(ServiceError::validation("A cover letter is required"));
        }
        self.simulate("apply").await;

        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        let posting = state
            .postings
            .iter()
            .find(|p| p.id == posting_id && state.visible_in_catalog(p))
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Posting", posting_id))?;

        let duplicate = state.applications.iter().any(|a| {
            a.posting_id == posting_id
                && a.applicant.id == identity.id
                && a.status != ApplicationStatus::Withdrawn
        });
        if duplicate {
            return Err(ServiceError::conflict(
                "You have already applied to this posting",
            ));
        }

        let applicant = state
            .account(identity.id)
            .map(StoredAccount::applicant)
            .ok_or(ServiceError::Unauthenticated)?;
        let id = state.next_id();
        let application = Application {
            id,
            posting_id,
            posting_title: posting.title.clone(),
            applicant,
            cover_letter: form.cover_letter.trim().to_string(),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
            reason: None,
        };
        state.applications.push(application.clone());
        state.log(
            ActivityKind::Application,
            format!("New application to {}", posting.title),
        );

        tracing::info!(application_id = id, posting_id, user_id = identity.id, "application submitted");
        Ok(application)
    }
}

#[async_trait]
impl ProfileService for MockBackend {
    async fn get_profile(&self, token: &str) -> Result<UserProfile> {
        self.simulate("get_profile").await;
        let state = self.state();
        let identity = self.authorize(&state, token, None)?;
        state
            .account(identity.id)
            .map(StoredAccount::user_profile)
            .ok_or(ServiceError::Unauthenticated)
    }

    async fn update_profile(&self, token: &str, update: ProfileUpdate) -> Result<UserProfile> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::validation("Name is required"));
            }
        }
        self.simulate("update_profile").await;

        let mut state = self.state();
        let identity = self.authorize(&state, token, None)?;
        let account = state
            .account_mut(identity.id)
            .ok_or(ServiceError::Unauthenticated)?;

        let mut merged = account.user_profile();
        merged.merge(update);
        account.identity = merged.identity.clone();
        account.profile = merged.profile.clone();

        if let Some(admin) = state.admins.iter_mut().find(|a| a.id == identity.id) {
            admin.name = merged.identity.name.clone();
            self.persisted.save_admins(&state.admins)?;
        } else {
            self.persist_registry(&state)?;
        }

        tracing::info!(user_id = identity.id, "profile updated");
        Ok(merged)
    }

    async fn list_applications(&self, token: &str) -> Result<Vec<Application>> {
        self.simulate("list_applications").await;
        let state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        let mut own: Vec<Application> = state
            .applications
            .iter()
            .filter(|a| a.applicant.id == identity.id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(own)
    }

    async fn withdraw_application(&self, token: &str, id: ApplicationId) -> Result<Application> {
        self.simulate("withdraw_application").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        let application = state
            .applications
            .iter_mut()
            .find(|a| a.id == id && a.applicant.id == identity.id)
            .ok_or_else(|| ServiceError::not_found("Application", id))?;
        if application.status != ApplicationStatus::Pending {
            return Err(ServiceError::conflict(format!(
                "Only pending applications can be withdrawn (this one is {})",
                application.status
            )));
        }
        application.status = ApplicationStatus::Withdrawn;
        let application = application.clone();

        tracing::info!(application_id = id, "application withdrawn");
        Ok(application)
    }
}

#[async_trait]
impl OrganizationService for MockBackend {
    async fn list_own_postings(&self, token: &str) -> Result<Vec<Posting>> {
        self.simulate("list_own_postings").await;
        let state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        Ok(state
            .postings
            .iter()
            .filter(|p| p.company_id == Some(company_id))
            .map(|p| state.counted(p))
            .collect())
    }

    async fn create_posting(
        &self,
        token: &str,
        fields: &NewPosting,
        mode: PublishMode,
    ) -> Result<Posting> {
        validate::posting(fields)?;
        self.simulate("create_posting").await;

        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        let status = match mode {
            PublishMode::Draft => PostingStatus::Draft,
            PublishMode::Publish if self.publish_requires_review => PostingStatus::Pending,
            PublishMode::Publish => PostingStatus::Active,
        };

        let id = state.next_id();
        let posting = Posting {
            id,
            title: fields.title.trim().to_string(),
            company: identity.name.clone(),
            company_id: Some(company_id),
            location: fields.location.trim().to_string(),
            duration: fields.duration.trim().to_string(),
            description: fields.description.trim().to_string(),
            tags: validate::clean_list(&fields.tags),
            status,
            created_at: Utc::now(),
            applications_count: 0,
            salary: fields.salary.clone().filter(|s| !s.trim().is_empty()),
            start_date: fields.start_date.clone().filter(|s| !s.trim().is_empty()),
            missions: validate::clean_list(&fields.missions),
            requirements: validate::clean_list(&fields.requirements),
            benefits: validate::clean_list(&fields.benefits),
            positions: fields.positions.unwrap_or(1).max(1),
        };
        state.postings.insert(0, posting.clone());
        if status != PostingStatus::Draft {
            state.log(
                ActivityKind::Posting,
                format!("New posting {}: {}", status, posting.title),
            );
        }

        tracing::info!(posting_id = id, company_id, status = %status, "posting created");
        Ok(posting)
    }

    async fn close_posting(&self, token: &str, id: PostingId) -> Result<Posting> {
        self.simulate("close_posting").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        let idx = state.posting_index(id)?;
        if state.postings[idx].company_id != Some(company_id) {
            return Err(ServiceError::Forbidden);
        }
        transition(&mut state.postings[idx], PostingStatus::Closed)?;
        let posting = state.counted(&state.postings[idx]);

        tracing::info!(posting_id = id, "posting closed");
        Ok(posting)
    }

    async fn list_received_applications(&self, token: &str) -> Result<Vec<Application>> {
        self.simulate("list_received_applications").await;
        let state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        let own: Vec<PostingId> = state
            .postings
            .iter()
            .filter(|p| p.company_id == Some(company_id))
            .map(|p| p.id)
            .collect();
        Ok(state
            .applications
            .iter()
            .filter(|a| own.contains(&a.posting_id) && a.status != ApplicationStatus::Withdrawn)
            .cloned()
            .collect())
    }

    async fn set_application_status(
        &self,
        token: &str,
        id: ApplicationId,
        decision: ApplicationDecision,
        reason: Option<String>,
    ) -> Result<Application> {
        self.simulate("set_application_status").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;

        let idx = state
            .applications
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| ServiceError::not_found("Application", id))?;
        let posting_id = state.applications[idx].posting_id;
        let owned = state
            .postings
            .iter()
            .any(|p| p.id == posting_id && p.company_id == Some(company_id));
        if !owned {
            return Err(ServiceError::not_found("Application", id));
        }

        let application = &mut state.applications[idx];
        if application.status != ApplicationStatus::Pending {
            return Err(ServiceError::conflict(format!(
                "Application {} is already {}",
                id, application.status
            )));
        }
        application.status = decision.into();
        application.reason = reason.filter(|r| !r.trim().is_empty());
        let application = application.clone();

        tracing::info!(application_id = id, status = %application.status, "application decided");
        Ok(application)
    }

    async fn list_company_conversations(&self, token: &str) -> Result<Vec<Conversation>> {
        self.simulate("list_company_conversations").await;
        let state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        Ok(state
            .conversations
            .iter()
            .filter(|c| c.company_id == Some(company_id))
            .cloned()
            .collect())
    }

    async fn reply(
        &self,
        token: &str,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<Message> {
        validate::message(text)?;
        self.simulate("reply").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Company))?;
        let company_id = self.company_of(&state, &identity)?;
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.company_id == Some(company_id))
            .ok_or_else(|| ServiceError::not_found("Conversation", conversation_id))?;

        let message = Message {
            text: text.trim().to_string(),
            sender: Sender::Company,
            timestamp: Utc::now(),
        };
        conversation.push(message.clone());
        Ok(message)
    }
}

/// Applies a posting status change if the workflow allows it.
fn transition(posting: &mut Posting, next: PostingStatus) -> Result<()> {
    if !posting.status.can_transition_to(next) {
        return Err(ServiceError::conflict(format!(
            "Posting {} cannot go from {} to {}",
            posting.id, posting.status, next
        )));
    }
    posting.status = next;
    Ok(())
}

#[async_trait]
impl ModerationService for MockBackend {
    async fn stats(&self, token: &str) -> Result<PlatformStats> {
        self.simulate("stats").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;

        let now = Utc::now();
        let month_ago = now - Duration::days(30);
        let today = now.date_naive();
        let by_role = |role: Role| {
            state
                .accounts
                .iter()
                .filter(|a| a.identity.role == role)
                .count() as u32
        };
        let postings_with = |status: PostingStatus| {
            state.postings.iter().filter(|p| p.status == status).count() as u32
        };

        Ok(PlatformStats {
            total_users: state.accounts.len() as u32,
            student_count: by_role(Role::Student),
            company_count: by_role(Role::Company),
            admin_count: by_role(Role::Admin),
            new_users_this_month: state
                .accounts
                .iter()
                .filter(|a| a.created_at >= month_ago)
                .count() as u32,
            total_postings: state.postings.len() as u32,
            active_postings: postings_with(PostingStatus::Active),
            pending_postings: postings_with(PostingStatus::Pending),
            total_companies: state.companies.len() as u32,
            active_companies: state
                .companies
                .iter()
                .filter(|c| c.status == CompanyStatus::Verified)
                .count() as u32,
            total_applications: state
                .applications
                .iter()
                .filter(|a| a.status != ApplicationStatus::Withdrawn)
                .count() as u32,
            applications_today: state
                .applications
                .iter()
                .filter(|a| a.applied_at.date_naive() == today)
                .count() as u32,
        })
    }

    async fn recent_activity(&self, token: &str) -> Result<Vec<Activity>> {
        self.simulate("recent_activity").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;
        Ok(state.activities.clone())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>> {
        self.simulate("list_users").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;
        Ok(state.accounts.iter().map(StoredAccount::record).collect())
    }

    async fn set_user_status(&self, token: &str, id: UserId, status: UserStatus) -> Result<()> {
        self.simulate("set_user_status").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        if admin.id == id {
            return Err(ServiceError::conflict("You cannot change your own status"));
        }
        let account = state
            .account_mut(id)
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        account.status = status;
        let name = account.identity.name.clone();
        if let Some(console_admin) = state.admins.iter_mut().find(|a| a.id == id) {
            console_admin.status = status;
            self.persisted.save_admins(&state.admins)?;
        }
        state.log(ActivityKind::Moderation, format!("User {} is now {}", name, status));
        self.persist_registry(&state)?;

        tracing::info!(admin_id = admin.id, user_id = id, status = %status, "user status changed");
        Ok(())
    }

    async fn delete_user(&self, token: &str, id: UserId) -> Result<()> {
        self.simulate("delete_user").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        if admin.id == id {
            return Err(ServiceError::conflict("You cannot delete your own account"));
        }
        let before = state.accounts.len();
        state.accounts.retain(|a| a.identity.id != id);
        if state.accounts.len() == before {
            return Err(ServiceError::not_found("User", id));
        }
        let before_admins = state.admins.len();
        state.admins.retain(|a| a.id != id);
        if state.admins.len() != before_admins {
            self.persisted.save_admins(&state.admins)?;
        }
        state.log(ActivityKind::Moderation, format!("User {} deleted", id));
        self.persist_registry(&state)?;

        tracing::info!(admin_id = admin.id, user_id = id, "user deleted");
        Ok(())
    }

    async fn list_all_postings(&self, token: &str) -> Result<Vec<Posting>> {
        self.simulate("list_all_postings").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;
        Ok(state.postings.iter().map(|p| state.counted(p)).collect())
    }

    async fn set_posting_status(
        &self,
        token: &str,
        id: PostingId,
        decision: ModerationDecision,
    ) -> Result<Posting> {
        self.simulate("set_posting_status").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        let idx = state.posting_index(id)?;
        transition(&mut state.postings[idx], decision.target_status())?;
        let posting = state.counted(&state.postings[idx]);
        state.log(
            ActivityKind::Moderation,
            format!("Posting {} is now {}", posting.title, posting.status),
        );

        tracing::info!(admin_id = admin.id, posting_id = id, status = %posting.status, "posting moderated");
        Ok(posting)
    }

    async fn delete_posting(&self, token: &str, id: PostingId) -> Result<()> {
        self.simulate("delete_posting").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        let idx = state.posting_index(id)?;
        let posting = state.postings.remove(idx);
        state.applications.retain(|a| a.posting_id != id);
        state.log(
            ActivityKind::Moderation,
            format!("Posting deleted: {}", posting.title),
        );

        tracing::info!(admin_id = admin.id, posting_id = id, "posting deleted");
        Ok(())
    }

    async fn list_companies(&self, token: &str) -> Result<Vec<Company>> {
        self.simulate("list_companies").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;
        Ok(state
            .companies
            .iter()
            .map(|c| state.counted_company(c))
            .collect())
    }

    async fn set_company_status(
        &self,
        token: &str,
        id: CompanyId,
        status: CompanyStatus,
    ) -> Result<Company> {
        self.simulate("set_company_status").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        let company = state
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::not_found("Company", id))?;
        company.status = status;
        let company = company.clone();
        state.log(
            ActivityKind::Moderation,
            format!("Company {} is now {}", company.name, status),
        );
        self.persist_companies(&state)?;

        tracing::info!(admin_id = admin.id, company_id = id, status = %status, "company status changed");
        Ok(state.counted_company(&company))
    }

    async fn add_admin(&self, token: &str, form: &AdminForm) -> Result<AdminAccount> {
        validate::admin(form)?;
        self.simulate("add_admin").await;
        let mut state = self.state();
        let admin = self.authorize(&state, token, Some(Role::Admin))?;
        if state.account_by_email(&form.email).is_some() {
            return Err(ServiceError::conflict("This email is already in use"));
        }

        let account = AdminAccount {
            id: state.next_id(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash: hash_password(&form.password),
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        state.accounts.push(StoredAccount::from_admin(&account));
        state.admins.push(account.clone());
        self.persisted.save_admins(&state.admins)?;
        state.log(
            ActivityKind::User,
            format!("Administrator added: {}", account.name),
        );

        tracing::info!(admin_id = admin.id, new_admin_id = account.id, "administrator added");
        Ok(account)
    }

    async fn list_admins(&self, token: &str) -> Result<Vec<AdminAccount>> {
        self.simulate("list_admins").await;
        let state = self.state();
        self.authorize(&state, token, Some(Role::Admin))?;
        Ok(state.admins.clone())
    }
}

#[async_trait]
impl MessagingService for MockBackend {
    async fn list_student_conversations(&self, token: &str) -> Result<Vec<Conversation>> {
        self.simulate("list_student_conversations").await;
        let state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        Ok(state
            .conversations
            .iter()
            .filter(|c| c.student_id == identity.id)
            .cloned()
            .collect())
    }

    async fn send_to_company(
        &self,
        token: &str,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<Message> {
        validate::message(text)?;
        self.simulate("send_to_company").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.student_id == identity.id)
            .ok_or_else(|| ServiceError::not_found("Conversation", conversation_id))?;

        let message = Message {
            text: text.trim().to_string(),
            sender: Sender::Student,
            timestamp: Utc::now(),
        };
        conversation.push(message.clone());
        Ok(message)
    }

    async fn start_conversation(
        &self,
        token: &str,
        company_name: &str,
        posting_title: &str,
        text: &str,
    ) -> Result<Conversation> {
        validate::message(text)?;
        self.simulate("start_conversation").await;
        let mut state = self.state();
        let identity = self.authorize(&state, token, Some(Role::Student))?;
        let company = state
            .companies
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(company_name.trim()))
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Company", company_name))?;

        let now = Utc::now();
        let text = text.trim().to_string();
        let conversation = Conversation {
            id: state.next_id(),
            student_id: identity.id,
            company_id: Some(company.id),
            student_name: identity.name.clone(),
            company_name: company.name.clone(),
            posting_title: posting_title.trim().to_string(),
            last_message: text.clone(),
            last_message_at: now,
            unread_count: 0,
            messages: vec![Message {
                text,
                sender: Sender::Student,
                timestamp: now,
            }],
        };
        state.conversations.insert(0, conversation.clone());

        tracing::info!(conversation_id = conversation.id, company = %company.name, "conversation started");
        Ok(conversation)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::Storage;
    use std::sync::Arc;

    pub(crate) fn backend_with(config: Config) -> MockBackend {
        let persisted = Persisted::new(Arc::new(Storage::open_in_memory().unwrap()));
        MockBackend::new(&config, persisted).unwrap()
    }

    pub(crate) fn backend() -> MockBackend {
        backend_with(Config::for_tests())
    }

    fn shared_storage() -> Persisted {
        Persisted::new(Arc::new(Storage::open_in_memory().unwrap()))
    }

    /// A fresh process over the same local storage.
    fn restart(persisted: &Persisted) -> MockBackend {
        MockBackend::new(&Config::for_tests(), persisted.clone()).unwrap()
    }

    fn acme_form() -> SignUpForm {
        SignUpForm {
            name: "Acme".to_string(),
            email: "jobs@acme.fr".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: Some(Role::Company),
        }
    }

    pub(crate) async fn token(backend: &MockBackend, email: &str, password: &str) -> String {
        AuthService::sign_in(backend, email, password)
            .await
            .unwrap()
            .token
    }

    pub(crate) async fn student(backend: &MockBackend) -> String {
        token(backend, "jean.dupont@email.com", "student123").await
    }

    pub(crate) async fn company(backend: &MockBackend) -> String {
        token(backend, "contact@techcorp.fr", "company123").await
    }

    pub(crate) async fn admin(backend: &MockBackend) -> String {
        token(backend, "admin@stagehub.fr", "adminadmin").await
    }

    #[tokio::test]
    async fn role_comes_from_the_account_not_the_password() {
        let backend = backend();

        let grant = backend.sign_in("admin@stagehub.fr", "adminadmin").await.unwrap();
        assert_eq!(grant.identity.role, Role::Admin);

        // A student whose password happens to be "adminadmin" stays a student.
        let form = SignUpForm {
            name: "Lea".to_string(),
            email: "lea@email.com".to_string(),
            password: "adminadmin".to_string(),
            confirm_password: "adminadmin".to_string(),
            role: None,
        };
        backend.sign_up(&form).await.unwrap();
        let grant = backend.sign_in("lea@email.com", "adminadmin").await.unwrap();
        assert_eq!(grant.identity.role, Role::Student);

        // An email mentioning "company" does not make a company.
        let form = SignUpForm {
            name: "Paul".to_string(),
            email: "paul.company@email.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: None,
        };
        let grant = backend.sign_up(&form).await.unwrap();
        assert_eq!(grant.identity.role, Role::Student);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_rejected() {
        let backend = backend();
        assert!(matches!(
            backend.sign_in("jean.dupont@email.com", "nope").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            backend.sign_in("ghost@email.com", "student123").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            backend.sign_in("", "").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn admins_cannot_self_register_and_emails_are_unique() {
        let backend = backend();
        let mut form = SignUpForm {
            name: "Eve".to_string(),
            email: "eve@email.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: Some(Role::Admin),
        };
        assert!(matches!(backend.sign_up(&form).await, Err(ServiceError::Forbidden)));

        form.role = Some(Role::Student);
        form.email = "JEAN.DUPONT@email.com".to_string();
        assert!(matches!(backend.sign_up(&form).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn catalog_only_shows_active_postings() {
        let backend = backend();
        let all = backend.list_postings(&PostingFilter::default()).await.unwrap();
        assert!(!all.is_empty());
        assert!(all.iter().all(|p| p.status == PostingStatus::Active));
        assert!(backend.get_posting(5).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn application_count_follows_apply_and_withdraw() {
        let backend = backend();
        let token = token(&backend, "marie.martin@email.com", "student123").await;
        let before = backend.get_posting(1).await.unwrap().applications_count;

        let form = ApplicationForm {
            cover_letter: "Motivated!".to_string(),
        };
        let application = backend.apply(&token, 1, &form).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(backend.get_posting(1).await.unwrap().applications_count, before + 1);

        assert!(matches!(
            backend.apply(&token, 1, &form).await,
            Err(ServiceError::Conflict(_))
        ));

        backend.withdraw_application(&token, application.id).await.unwrap();
        assert_eq!(backend.get_posting(1).await.unwrap().applications_count, before);

        // Withdrawn frees the slot for a new application.
        backend.apply(&token, 1, &form).await.unwrap();
    }

    #[tokio::test]
    async fn companies_cannot_apply() {
        let backend = backend();
        let token = company(&backend).await;
        let form = ApplicationForm {
            cover_letter: "Hi".to_string(),
        };
        assert!(matches!(
            backend.apply(&token, 1, &form).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn publish_mode_drives_initial_status() {
        let backend = backend();
        let token = company(&backend).await;
        let fields = NewPosting {
            title: "QA Internship".to_string(),
            location: "Paris".to_string(),
            duration: "2 months".to_string(),
            description: "Test things".to_string(),
            tags: vec!["QA".to_string(), "QA".to_string()],
            ..NewPosting::default()
        };

        let draft = backend
            .create_posting(&token, &fields, PublishMode::Draft)
            .await
            .unwrap();
        assert_eq!(draft.status, PostingStatus::Draft);
        assert_eq!(draft.applications_count, 0);
        assert_eq!(draft.tags, vec!["QA"]);

        let live = backend
            .create_posting(&token, &fields, PublishMode::Publish)
            .await
            .unwrap();
        assert_eq!(live.status, PostingStatus::Active);

        let own = backend.list_own_postings(&token).await.unwrap();
        assert_eq!(own[0].id, live.id);
        assert_eq!(own[1].id, draft.id);
    }

    #[tokio::test]
    async fn review_gate_holds_publications_in_pending() {
        let backend = backend_with(Config {
            publish_requires_review: true,
            ..Config::for_tests()
        });
        let token = company(&backend).await;
        let fields = NewPosting {
            title: "Ops Internship".to_string(),
            location: "Paris".to_string(),
            duration: "6 months".to_string(),
            description: "Run things".to_string(),
            ..NewPosting::default()
        };
        let posting = backend
            .create_posting(&token, &fields, PublishMode::Publish)
            .await
            .unwrap();
        assert_eq!(posting.status, PostingStatus::Pending);

        let admin = admin(&backend).await;
        let approved = backend
            .set_posting_status(&admin, posting.id, ModerationDecision::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, PostingStatus::Active);
    }

    #[tokio::test]
    async fn application_status_changes_exactly_once() {
        let backend = backend();
        let token = company(&backend).await;
        let accepted = backend
            .set_application_status(&token, 1, ApplicationDecision::Accepted, None)
            .await
            .unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);

        assert!(matches!(
            backend
                .set_application_status(&token, 1, ApplicationDecision::Rejected, None)
                .await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn companies_only_see_their_own_applications() {
        let backend = backend();
        let token = company(&backend).await;
        let received = backend.list_received_applications(&token).await.unwrap();
        assert!(received.iter().all(|a| a.posting_id == 1));

        // Application 2 targets Digital Agency's posting.
        assert!(
            backend
                .set_application_status(&token, 2, ApplicationDecision::Accepted, None)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn illegal_moderation_transition_is_a_conflict() {
        let backend = backend();
        let admin = admin(&backend).await;
        // Posting 5 is a draft; approving skips the company's own publish step
        // and is allowed, but rejecting a draft is not.
        assert!(matches!(
            backend
                .set_posting_status(&admin, 5, ModerationDecision::Rejected)
                .await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn suspended_users_lose_access() {
        let backend = backend();
        let admin = admin(&backend).await;
        let student = student(&backend).await;

        backend.set_user_status(&admin, 1, UserStatus::Suspended).await.unwrap();
        assert!(matches!(
            backend.get_profile(&student).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            backend.sign_in("jean.dupont@email.com", "student123").await,
            Err(ServiceError::Forbidden)
        ));

        assert!(matches!(
            backend.set_user_status(&admin, 5, UserStatus::Suspended).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn suspending_a_company_hides_its_postings() {
        let backend = backend();
        let admin = admin(&backend).await;
        backend
            .set_company_status(&admin, 1, CompanyStatus::Suspended)
            .await
            .unwrap();
        let all = backend.list_postings(&PostingFilter::default()).await.unwrap();
        assert!(all.iter().all(|p| p.company_id != Some(1)));
    }

    #[tokio::test]
    async fn stats_reflect_live_state() {
        let backend = backend();
        let admin = admin(&backend).await;
        let stats = backend.stats(&admin).await.unwrap();
        assert_eq!(stats.total_users, 8);
        assert_eq!(stats.admin_count, 1);
        assert_eq!(stats.active_postings, 3);
        assert_eq!(stats.pending_postings, 1);
        assert_eq!(stats.total_companies, 3);

        let student = student(&backend).await;
        assert!(matches!(backend.stats(&student).await, Err(ServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn added_admins_can_sign_in() {
        let backend = backend();
        let admin = admin(&backend).await;
        let form = AdminForm {
            name: "Second Admin".to_string(),
            email: "second@stagehub.fr".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };
        backend.add_admin(&admin, &form).await.unwrap();
        assert!(matches!(
            backend.add_admin(&admin, &form).await,
            Err(ServiceError::Conflict(_))
        ));

        let grant = backend.sign_in("second@stagehub.fr", "secret1").await.unwrap();
        assert_eq!(grant.identity.role, Role::Admin);
        assert_eq!(backend.list_admins(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn forged_tokens_are_unauthenticated() {
        let backend = backend();
        assert!(matches!(
            backend.get_profile("mock-jwt-token-1").await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn registered_companies_survive_a_restart() {
        let persisted = shared_storage();
        restart(&persisted).sign_up(&acme_form()).await.unwrap();

        let backend = restart(&persisted);
        let admin_token = admin(&backend).await;
        let acme = backend
            .list_companies(&admin_token)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Acme")
            .expect("registered company is restored");
        assert_eq!(acme.status, CompanyStatus::Pending);
        backend
            .set_company_status(&admin_token, acme.id, CompanyStatus::Verified)
            .await
            .unwrap();

        let student_token = student(&backend).await;
        let thread = backend
            .start_conversation(&student_token, "acme", "Stage", "Bonjour")
            .await
            .unwrap();
        assert_eq!(thread.company_id, Some(acme.id));

        let backend = restart(&persisted);
        let admin_token = admin(&backend).await;
        let companies = backend.list_companies(&admin_token).await.unwrap();
        let restored: Vec<&Company> = companies.iter().filter(|c| c.name == "Acme").collect();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].status, CompanyStatus::Verified);
    }

    #[tokio::test]
    async fn company_accounts_without_a_saved_row_get_a_pending_one() {
        let persisted = shared_storage();
        let grant = restart(&persisted).sign_up(&acme_form()).await.unwrap();
        persisted.storage().remove(crate::persist::keys::COMPANIES).unwrap();

        let backend = restart(&persisted);
        let admin_token = admin(&backend).await;
        let acme = backend
            .list_companies(&admin_token)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Acme")
            .expect("row rebuilt from the account");
        assert_eq!(acme.status, CompanyStatus::Pending);
        assert_ne!(acme.id, grant.identity.id);

        // Fresh ids stay clear of the rebuilt company id.
        let form = SignUpForm {
            name: "Nina".to_string(),
            email: "nina@email.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: None,
        };
        let nina = backend.sign_up(&form).await.unwrap();
        assert!(nina.identity.id > acme.id);
    }

    #[tokio::test]
    async fn suspended_console_admins_stay_suspended_after_restart() {
        let persisted = shared_storage();
        let backend = restart(&persisted);
        let admin_token = admin(&backend).await;
        let form = AdminForm {
            name: "Second Admin".to_string(),
            email: "second@stagehub.fr".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };
        let added = backend.add_admin(&admin_token, &form).await.unwrap();
        backend
            .set_user_status(&admin_token, added.id, UserStatus::Suspended)
            .await
            .unwrap();

        let backend = restart(&persisted);
        assert!(matches!(
            backend.sign_in("second@stagehub.fr", "secret1").await,
            Err(ServiceError::Forbidden)
        ));
        let admin_token = admin(&backend).await;
        let admins = backend.list_admins(&admin_token).await.unwrap();
        assert_eq!(admins[0].status, UserStatus::Suspended);

        backend
            .set_user_status(&admin_token, added.id, UserStatus::Active)
            .await
            .unwrap();
        let backend = restart(&persisted);
        assert!(backend.sign_in("second@stagehub.fr", "secret1").await.is_ok());
    }
}
