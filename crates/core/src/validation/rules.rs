//! Domain rule groups for each request payload.
//!
//! Length and range limits are declared on the payload types with
//! `#[derive(Validate)]`; the sets below carry the format, closed-set,
//! clock-dependent and cross-field checks.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;

use super::cities::is_known_city;
use super::plate::is_valid_license_plate;
use super::{RuleSet, ValidationContext};
use crate::auth::{ChangePasswordRequest, LoginRequest};
use crate::service_entries::ServiceEntryPayload;
use crate::types::Timestamp;

pub const MIN_MODEL_YEAR: i32 = 1900;

/// Largest annual distance assumed by the mileage plausibility check.
pub const MAX_ANNUAL_KM: i64 = 60_000;

/// Service dates up to this many hours past "now" are accepted to absorb
/// time-zone skew.
pub const SERVICE_DATE_SKEW_HOURS: i64 = 24;

pub const PLATE_FORMAT_MESSAGE: &str =
    "Enter a valid license plate, for example 34ABC123, 06AB1234 or 34A1234";
pub const MILEAGE_FOR_AGE_MESSAGE: &str =
    "Odometer reading looks too high for the vehicle's age, please check it";

const USERNAME_FORBIDDEN_TOKENS: [&str; 9] = ["'", "\"", ";", "--", "/*", "*/", "<", ">", "&"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.\-]+$").expect("valid regex"));

/// Service dates must be strictly later than this instant.
pub fn earliest_service_date() -> Timestamp {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Letters, digits, whitespace and hyphens only. Blank values pass; the
/// required rule reports those.
fn has_plain_characters(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || c == '-')
}

fn model_year_in_range(year: i32, ctx: &ValidationContext) -> Result<(), String> {
    let latest = ctx.current_year() + 1;
    if (MIN_MODEL_YEAR..=latest).contains(&year) {
        Ok(())
    } else {
        Err(format!(
            "Model year must be between {MIN_MODEL_YEAR} and {latest}"
        ))
    }
}

// ---------------------------------------------------------------------------
// Service entries
// ---------------------------------------------------------------------------

/// Domain rules for create and update payloads.
pub fn service_entry_rules() -> RuleSet<ServiceEntryPayload> {
    RuleSet::new("service_entry")
        .rule("license_plate", "License plate is required", |p: &ServiceEntryPayload, _| {
            !is_blank(&p.license_plate)
        })
        .rule("license_plate", PLATE_FORMAT_MESSAGE, |p: &ServiceEntryPayload, _| {
            is_blank(&p.license_plate) || is_valid_license_plate(&p.license_plate)
        })
        .rule("brand_name", "Brand name is required", |p: &ServiceEntryPayload, _| {
            !is_blank(&p.brand_name)
        })
        .rule(
            "brand_name",
            "Brand name must not contain special characters",
            |p: &ServiceEntryPayload, _| has_plain_characters(&p.brand_name),
        )
        .rule("model_name", "Model name is required", |p: &ServiceEntryPayload, _| {
            !is_blank(&p.model_name)
        })
        .rule(
            "model_name",
            "Model name must not contain special characters",
            |p: &ServiceEntryPayload, _| has_plain_characters(&p.model_name),
        )
        .rule("odometer", "Odometer reading is required", |p: &ServiceEntryPayload, _| {
            p.odometer.is_some()
        })
        .check("model_year", |p: &ServiceEntryPayload, ctx| match p.model_year {
            Some(year) => model_year_in_range(year, ctx),
            None => Ok(()),
        })
        .rule("service_date", "Service date is required", |p: &ServiceEntryPayload, _| {
            p.service_date.is_some()
        })
        .rule(
            "service_date",
            "Service date cannot be in the future",
            |p: &ServiceEntryPayload, ctx| {
                let latest = ctx.now() + Duration::hours(SERVICE_DATE_SKEW_HOURS);
                p.service_date.is_none_or(|date| date.to_utc() <= latest)
            },
        )
        .rule("service_date", "Service date is too old", |p: &ServiceEntryPayload, _| {
            p.service_date
                .is_none_or(|date| date.to_utc() > earliest_service_date())
        })
        .rule(
            "service_city",
            "Enter a valid Turkish province",
            |p: &ServiceEntryPayload, _| {
                p.service_city
                    .as_deref()
                    .filter(|city| !is_blank(city))
                    .is_none_or(is_known_city)
            },
        )
        // Plausibility heuristic, not a domain law: flags readings above
        // MAX_ANNUAL_KM per year of vehicle age for a human to re-check.
        .rule(
            "model_year",
            "Model year is ahead of the current year",
            |p: &ServiceEntryPayload, ctx| vehicle_age(p, ctx).is_none_or(|age| age >= 0),
        )
        .rule("odometer", MILEAGE_FOR_AGE_MESSAGE, |p: &ServiceEntryPayload, ctx| {
            match (vehicle_age(p, ctx), p.odometer) {
                (Some(age), Some(odometer)) if age >= 0 => odometer <= age * MAX_ANNUAL_KM,
                _ => true,
            }
        })
}

/// Years between the model year and the current year, when a model year
/// was given.
fn vehicle_age(payload: &ServiceEntryPayload, ctx: &ValidationContext) -> Option<i64> {
    payload
        .model_year
        .map(|year| i64::from(ctx.current_year()) - i64::from(year))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

pub fn login_rules() -> RuleSet<LoginRequest> {
    RuleSet::new("login")
        .rule("username", "Username is required", |r: &LoginRequest, _| {
            !is_blank(&r.username)
        })
        .rule(
            "username",
            "Username contains invalid characters",
            |r: &LoginRequest, _| is_blank(&r.username) || !contains_forbidden_token(&r.username),
        )
        .rule(
            "username",
            "Username may only contain letters, digits, hyphens, underscores and dots",
            |r: &LoginRequest, _| is_blank(&r.username) || USERNAME_RE.is_match(&r.username),
        )
        .rule("password", "Password is required", |r: &LoginRequest, _| {
            !is_blank(&r.password)
        })
}

pub fn change_password_rules() -> RuleSet<ChangePasswordRequest> {
    RuleSet::new("change_password")
        .rule(
            "current_password",
            "Current password is required",
            |r: &ChangePasswordRequest, _| !is_blank(&r.current_password),
        )
        .rule(
            "new_password",
            "New password is required",
            |r: &ChangePasswordRequest, _| !is_blank(&r.new_password),
        )
        .rule(
            "new_password",
            "New password must differ from the current password",
            |r: &ChangePasswordRequest, _| r.new_password != r.current_password,
        )
}

fn contains_forbidden_token(username: &str) -> bool {
    USERNAME_FORBIDDEN_TOKENS
        .iter()
        .any(|token| username.contains(token))
}
