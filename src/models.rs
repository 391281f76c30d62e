//! Records kept by the store and the request payloads that create/update them.
//!
//! Payload types carry a `validate()` that enforces the range and non-empty
//! constraints before anything reaches the store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};
use crate::scoring::RatingTriple;

pub type Id = u64;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn yes() -> bool {
    true
}

fn check_rating(name: &str, v: u8) -> AppResult<()> {
    if (RATING_MIN..=RATING_MAX).contains(&v) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{name} must be between {RATING_MIN} and {RATING_MAX}"
        )))
    }
}

fn check_not_blank(name: &str, v: &str) -> AppResult<()> {
    if v.trim().is_empty() {
        Err(AppError::validation(format!("{name} must not be empty")))
    } else {
        Ok(())
    }
}

fn check_hold_hours(v: Option<f64>) -> AppResult<()> {
    match v {
        Some(h) if !h.is_finite() || h < 0.0 => Err(AppError::validation(
            "hold_hours must be a non-negative number",
        )),
        _ => Ok(()),
    }
}

pub fn check_email(email: &str) -> AppResult<()> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AppError::validation("email is not a valid address"))
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurlPattern {
    #[serde(rename = "2A")]
    Type2A,
    #[serde(rename = "2B")]
    Type2B,
    #[serde(rename = "2C")]
    Type2C,
    #[serde(rename = "3A")]
    Type3A,
    #[serde(rename = "3B")]
    Type3B,
    #[serde(rename = "3C")]
    Type3C,
    #[serde(rename = "4A")]
    Type4A,
    #[serde(rename = "4B")]
    Type4B,
    #[serde(rename = "4C")]
    Type4C,
}

/// Shared low/medium/high scale (porosity, density).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Thickness {
    Fine,
    Medium,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalpType {
    Dry,
    Oily,
    Sensitive,
    Normal,
}

/// Hair profile gathered during onboarding. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HairProfile {
    #[serde(default)]
    pub curl_pattern: Option<CurlPattern>,
    #[serde(default)]
    pub porosity: Option<Level>,
    #[serde(default)]
    pub density: Option<Level>,
    #[serde(default)]
    pub thickness: Option<Thickness>,
    #[serde(default)]
    pub scalp_type: Option<ScalpType>,
    /// "city, state, country"; the city part drives weather lookups.
    #[serde(default)]
    pub location: Option<String>,
}

impl HairProfile {
    /// Overwrite only the fields present in `update`.
    pub fn merge(&mut self, update: HairProfile) {
        if update.curl_pattern.is_some() {
            self.curl_pattern = update.curl_pattern;
        }
        if update.porosity.is_some() {
            self.porosity = update.porosity;
        }
        if update.density.is_some() {
            self.density = update.density;
        }
        if update.thickness.is_some() {
            self.thickness = update.thickness;
        }
        if update.scalp_type.is_some() {
            self.scalp_type = update.scalp_type;
        }
        if update.location.is_some() {
            self.location = update.location;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(flatten)]
    pub profile: HairProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: HairProfile,
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl UserCreate {
    pub fn validate(&self) -> AppResult<()> {
        check_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: HairProfile,
}

impl UserUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    Shampoo,
    Conditioner,
    LeaveIn,
    Cream,
    Gel,
    Mousse,
    Oil,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Id,
    pub user_id: Id,
    pub brand: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
    pub ingredients: Vec<String>,
    pub notes: Option<String>,
    pub usage_count: u32,
    pub success_rate: f64,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub brand: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProductCreate {
    pub fn validate(&self) -> AppResult<()> {
        check_not_blank("brand", &self.brand)?;
        check_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub brand: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ProductType>,
    pub ingredients: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl ProductUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(b) = &self.brand {
            check_not_blank("brand", b)?;
        }
        if let Some(n) = &self.name {
            check_not_blank("name", n)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineStep {
    /// cleanse, condition, style, ...
    pub step_type: String,
    #[serde(default)]
    pub product_id: Option<Id>,
    pub order: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Routine {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub is_template: bool,
    pub is_public: bool,
    pub steps: Vec<RoutineStep>,
    pub method_tags: Vec<String>,
    pub drying_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutineCreate {
    pub name: String,
    #[serde(default = "yes")]
    pub is_template: bool,
    #[serde(default)]
    pub is_public: bool,
    pub steps: Vec<RoutineStep>,
    #[serde(default)]
    pub method_tags: Option<Vec<String>>,
    #[serde(default)]
    pub drying_method: Option<String>,
}

fn check_steps(steps: &[RoutineStep]) -> AppResult<()> {
    if steps.is_empty() {
        return Err(AppError::validation("a routine needs at least one step"));
    }
    for s in steps {
        check_not_blank("step_type", &s.step_type)?;
    }
    Ok(())
}

impl RoutineCreate {
    pub fn validate(&self) -> AppResult<()> {
        check_not_blank("name", &self.name)?;
        check_steps(&self.steps)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutineUpdate {
    pub name: Option<String>,
    pub is_template: Option<bool>,
    pub is_public: Option<bool>,
    pub steps: Option<Vec<RoutineStep>>,
    pub method_tags: Option<Vec<String>>,
    pub drying_method: Option<String>,
}

impl RoutineUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(n) = &self.name {
            check_not_blank("name", n)?;
        }
        if let Some(steps) = &self.steps {
            check_steps(steps)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Routine logs
// ---------------------------------------------------------------------------

/// Step name -> product ids used in that step.
pub type ProductsUsed = BTreeMap<String, Vec<Id>>;

#[derive(Debug, Clone, Serialize)]
pub struct RoutineLog {
    pub id: Id,
    pub user_id: Id,
    pub routine_id: Option<Id>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub products_used: ProductsUsed,
    pub wash_day: bool,
    pub styling_method: Option<String>,
    pub drying_method: Option<String>,
    /// Minutes.
    pub time_spent: Option<u32>,
    pub notes: Option<String>,
    pub photo_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoutineLog {
    pub fn uses_product(&self, product_id: Id) -> bool {
        self.products_used
            .values()
            .any(|ids| ids.contains(&product_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutineLogCreate {
    #[serde(default)]
    pub routine_id: Option<Id>,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub products_used: Option<ProductsUsed>,
    #[serde(default = "yes")]
    pub wash_day: bool,
    #[serde(default)]
    pub styling_method: Option<String>,
    #[serde(default)]
    pub drying_method: Option<String>,
    #[serde(default)]
    pub time_spent: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutineLogUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub products_used: Option<ProductsUsed>,
    pub wash_day: Option<bool>,
    pub styling_method: Option<String>,
    pub drying_method: Option<String>,
    pub time_spent: Option<u32>,
    pub notes: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start_date.is_none_or(|s| d >= s) && self.end_date.is_none_or(|e| d <= e)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub id: Id,
    pub routine_log_id: Id,
    pub frizz: u8,
    pub definition: u8,
    pub softness: u8,
    pub hold_hours: Option<f64>,
    pub overall_score: f64,
    pub notes: Option<String>,
    pub rated_at: DateTime<Utc>,
}

impl Outcome {
    pub fn ratings(&self) -> RatingTriple {
        RatingTriple::new(self.frizz, self.definition, self.softness, self.hold_hours)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeCreate {
    pub routine_log_id: Id,
    pub frizz: u8,
    pub definition: u8,
    pub softness: u8,
    #[serde(default)]
    pub hold_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OutcomeCreate {
    pub fn validate(&self) -> AppResult<()> {
        check_rating("frizz", self.frizz)?;
        check_rating("definition", self.definition)?;
        check_rating("softness", self.softness)?;
        check_hold_hours(self.hold_hours)
    }

    pub fn ratings(&self) -> RatingTriple {
        RatingTriple::new(self.frizz, self.definition, self.softness, self.hold_hours)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeUpdate {
    pub frizz: Option<u8>,
    pub definition: Option<u8>,
    pub softness: Option<u8>,
    /// `null` clears the hold time, absence keeps it.
    #[serde(default, deserialize_with = "double_option")]
    pub hold_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl OutcomeUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(v) = self.frizz {
            check_rating("frizz", v)?;
        }
        if let Some(v) = self.definition {
            check_rating("definition", v)?;
        }
        if let Some(v) = self.softness {
            check_rating("softness", v)?;
        }
        if let Some(h) = self.hold_hours {
            check_hold_hours(h)?;
        }
        Ok(())
    }

    /// True when any input of the overall score is being changed.
    pub fn touches_ratings(&self) -> bool {
        self.frizz.is_some()
            || self.definition.is_some()
            || self.softness.is_some()
            || self.hold_hours.is_some()
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WeatherRecord {
    pub id: Id,
    pub user_id: Id,
    pub date: NaiveDate,
    pub location: String,
    /// Percent.
    pub humidity: f64,
    /// Celsius.
    pub dew_point: f64,
    /// Celsius.
    pub temperature: f64,
    /// m/s.
    pub wind_speed: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherFetchQuery {
    pub target_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
}
