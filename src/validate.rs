//! Synchronous form checks, run before any simulated call.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Result, ServiceError};
use crate::models::{AdminForm, CompanyOnboarding, NewPosting, SignUpForm, StudentOnboarding};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_COMPANY_DESCRIPTION_LEN: usize = 50;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$")
            .expect("valid url pattern")
    })
}

fn required(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(message));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    required(value, "Email is required")?;
    if !email_regex().is_match(value.trim()) {
        return Err(ServiceError::validation("Invalid email format"));
    }
    Ok(())
}

pub fn password(value: &str, confirmation: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ServiceError::validation("Password is required"));
    }
    if value != confirmation {
        return Err(ServiceError::validation("Passwords do not match"));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ServiceError::validation("Email and password are required"));
    }
    Ok(())
}

pub fn sign_up(form: &SignUpForm) -> Result<()> {
    required(&form.name, "Name is required")?;
    email(&form.email)?;
    password(&form.password, &form.confirm_password)
}

pub fn admin(form: &AdminForm) -> Result<()> {
    required(&form.name, "Name is required")?;
    email(&form.email)?;
    password(&form.password, &form.confirm_password)
}

pub fn student_onboarding(form: &StudentOnboarding) -> Result<()> {
    required(&form.bio, "A bio is required")?;
    required(&form.education, "Education level is required")?;
    required(&form.field, "Field of study is required")?;
    if form.skills.iter().all(|s| s.trim().is_empty()) {
        return Err(ServiceError::validation("Add at least one skill"));
    }
    required(&form.location, "Location is required")
}

pub fn company_onboarding(form: &CompanyOnboarding) -> Result<()> {
    required(&form.website, "A website is required")?;
    if !url_regex().is_match(form.website.trim()) {
        return Err(ServiceError::validation(
            "Enter a valid URL (e.g. www.company.com)",
        ));
    }
    if form.sectors.is_empty() {
        return Err(ServiceError::validation("Add at least one sector"));
    }
    required(&form.description, "A company description is required")?;
    if form.description.chars().count() < MIN_COMPANY_DESCRIPTION_LEN {
        return Err(ServiceError::validation(format!(
            "Description must be at least {} characters",
            MIN_COMPANY_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

pub fn posting(fields: &NewPosting) -> Result<()> {
    required(&fields.title, "Title is required")?;
    required(&fields.location, "Location is required")?;
    required(&fields.duration, "Duration is required")?;
    required(&fields.description, "Description is required")
}

pub fn message(text: &str) -> Result<()> {
    required(text, "Message cannot be empty")
}

/// Trims entries, drops blanks and repeated values, keeps first-seen order.
pub fn clean_list(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}
