//! In-process persistence.
//!
//! All tables live behind one `RwLock`; each public method takes the lock once,
//! so a request observes and mutates a consistent snapshot. Every query is
//! scoped by the owning user id: rows of other users look exactly like missing
//! rows (`NotFound`).

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::dashboard::RatedLog;
use crate::error::{AppError, AppResult};
use crate::models::{
    DateRange, HairProfile, Id, LogQuery, Outcome, OutcomeCreate, OutcomeUpdate, Product,
    ProductCreate, ProductUpdate, Routine, RoutineCreate, RoutineLog, RoutineLogCreate,
    RoutineLogUpdate, RoutineUpdate, User, UserUpdate, WeatherRecord,
};
use crate::scoring::overall_score;

/// Outcome score at or above which a log counts as a success for its products.
pub const SUCCESS_SCORE: f64 = 3.5;

#[derive(Debug, Default)]
struct Tables {
    last_id: Id,
    users: BTreeMap<Id, User>,
    products: BTreeMap<Id, Product>,
    routines: BTreeMap<Id, Routine>,
    logs: BTreeMap<Id, RoutineLog>,
    outcomes: BTreeMap<Id, Outcome>,
    weather: BTreeMap<Id, WeatherRecord>,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }

    fn owned_log(&self, user_id: Id, log_id: Id) -> Option<&RoutineLog> {
        self.logs.get(&log_id).filter(|l| l.user_id == user_id)
    }

    fn outcome_for_log(&self, log_id: Id) -> Option<&Outcome> {
        self.outcomes.values().find(|o| o.routine_log_id == log_id)
    }

    /// Outcome ids whose log belongs to `user_id`.
    fn owns_outcome(&self, user_id: Id, outcome_id: Id) -> bool {
        self.outcomes
            .get(&outcome_id)
            .and_then(|o| self.owned_log(user_id, o.routine_log_id))
            .is_some()
    }

    fn remove_log(&mut self, log_id: Id) {
        self.logs.remove(&log_id);
        self.outcomes.retain(|_, o| o.routine_log_id != log_id);
    }

    /// Recompute `usage_count` and `success_rate` for every product of a user.
    fn refresh_product_stats(&mut self, user_id: Id) {
        let logs: Vec<&RoutineLog> = self.logs.values().filter(|l| l.user_id == user_id).collect();
        let scores: BTreeMap<Id, f64> = self
            .outcomes
            .values()
            .map(|o| (o.routine_log_id, o.overall_score))
            .collect();

        for p in self.products.values_mut().filter(|p| p.user_id == user_id) {
            let mut used = 0u32;
            let mut rated = 0u32;
            let mut good = 0u32;
            for log in logs.iter().filter(|l| l.uses_product(p.id)) {
                used += 1;
                if let Some(&score) = scores.get(&log.id) {
                    rated += 1;
                    if score >= SUCCESS_SCORE {
                        good += 1;
                    }
                }
            }
            p.usage_count = used;
            p.success_rate = if rated > 0 {
                f64::from(good) / f64::from(rated)
            } else {
                0.0
            };
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(
        &self,
        email: &str,
        password_hash: String,
        profile: HairProfile,
    ) -> AppResult<User> {
        let email = email.trim().to_ascii_lowercase();
        let mut t = self.inner.write();
        if t.users.values().any(|u| u.email == email) {
            return Err(AppError::BadRequest("Email already registered".into()));
        }
        let id = t.next_id();
        let user = User {
            id,
            email,
            password_hash,
            profile,
            created_at: Utc::now(),
            updated_at: None,
        };
        t.users.insert(id, user.clone());
        debug!(user_id = id, "user created");
        Ok(user)
    }

    pub fn user(&self, id: Id) -> Option<User> {
        self.inner.read().users.get(&id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim().to_ascii_lowercase();
        self.inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn update_user(&self, id: Id, update: UserUpdate) -> AppResult<User> {
        let mut t = self.inner.write();
        if let Some(email) = &update.email {
            let email = email.trim().to_ascii_lowercase();
            if t.users.values().any(|u| u.email == email && u.id != id) {
                return Err(AppError::BadRequest("Email already registered".into()));
            }
        }
        let user = t.users.get_mut(&id).ok_or(AppError::NotFound("User"))?;
        if let Some(email) = update.email {
            user.email = email.trim().to_ascii_lowercase();
        }
        user.profile.merge(update.profile);
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    pub fn update_profile(&self, id: Id, profile: HairProfile) -> AppResult<User> {
        self.update_user(
            id,
            UserUpdate {
                email: None,
                profile,
            },
        )
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub fn create_product(&self, user_id: Id, data: ProductCreate) -> Product {
        let mut t = self.inner.write();
        let id = t.next_id();
        let product = Product {
            id,
            user_id,
            brand: data.brand,
            name: data.name,
            kind: data.kind,
            ingredients: data.ingredients.unwrap_or_default(),
            notes: data.notes,
            usage_count: 0,
            success_rate: 0.0,
            is_starred: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        t.products.insert(id, product.clone());
        product
    }

    pub fn products(&self, user_id: Id, starred_only: bool) -> Vec<Product> {
        self.inner
            .read()
            .products
            .values()
            .filter(|p| p.user_id == user_id && (!starred_only || p.is_starred))
            .cloned()
            .collect()
    }

    pub fn product(&self, user_id: Id, id: Id) -> AppResult<Product> {
        self.inner
            .read()
            .products
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned()
            .ok_or(AppError::NotFound("Product"))
    }

    pub fn update_product(&self, user_id: Id, id: Id, update: ProductUpdate) -> AppResult<Product> {
        let mut t = self.inner.write();
        let p = t
            .products
            .get_mut(&id)
            .filter(|p| p.user_id == user_id)
            .ok_or(AppError::NotFound("Product"))?;
        if let Some(v) = update.brand {
            p.brand = v;
        }
        if let Some(v) = update.name {
            p.name = v;
        }
        if let Some(v) = update.kind {
            p.kind = v;
        }
        if let Some(v) = update.ingredients {
            p.ingredients = v;
        }
        if let Some(v) = update.notes {
            p.notes = Some(v);
        }
        p.updated_at = Some(Utc::now());
        Ok(p.clone())
    }

    pub fn toggle_star(&self, user_id: Id, id: Id) -> AppResult<Product> {
        let mut t = self.inner.write();
        let p = t
            .products
            .get_mut(&id)
            .filter(|p| p.user_id == user_id)
            .ok_or(AppError::NotFound("Product"))?;
        p.is_starred = !p.is_starred;
        p.updated_at = Some(Utc::now());
        Ok(p.clone())
    }

    pub fn delete_product(&self, user_id: Id, id: Id) -> AppResult<()> {
        let mut t = self.inner.write();
        match t.products.get(&id) {
            Some(p) if p.user_id == user_id => {
                t.products.remove(&id);
                Ok(())
            }
            _ => Err(AppError::NotFound("Product")),
        }
    }

    // ------------------------------------------------------------------
    // Routines
    // ------------------------------------------------------------------

    pub fn create_routine(&self, user_id: Id, data: RoutineCreate) -> Routine {
        let mut t = self.inner.write();
        let id = t.next_id();
        let routine = Routine {
            id,
            user_id,
            name: data.name,
            is_template: data.is_template,
            is_public: data.is_public,
            steps: data.steps,
            method_tags: data.method_tags.unwrap_or_default(),
            drying_method: data.drying_method,
            created_at: Utc::now(),
            updated_at: None,
        };
        t.routines.insert(id, routine.clone());
        routine
    }

    pub fn routines(&self, user_id: Id) -> Vec<Routine> {
        self.inner
            .read()
            .routines
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn routine(&self, user_id: Id, id: Id) -> AppResult<Routine> {
        self.inner
            .read()
            .routines
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or(AppError::NotFound("Routine"))
    }

    pub fn update_routine(&self, user_id: Id, id: Id, update: RoutineUpdate) -> AppResult<Routine> {
        let mut t = self.inner.write();
        let r = t
            .routines
            .get_mut(&id)
            .filter(|r| r.user_id == user_id)
            .ok_or(AppError::NotFound("Routine"))?;
        if let Some(v) = update.name {
            r.name = v;
        }
        if let Some(v) = update.is_template {
            r.is_template = v;
        }
        if let Some(v) = update.is_public {
            r.is_public = v;
        }
        if let Some(v) = update.steps {
            r.steps = v;
        }
        if let Some(v) = update.method_tags {
            r.method_tags = v;
        }
        if let Some(v) = update.drying_method {
            r.drying_method = Some(v);
        }
        r.updated_at = Some(Utc::now());
        Ok(r.clone())
    }

    /// Deletes the routine together with its logs and their outcomes.
    pub fn delete_routine(&self, user_id: Id, id: Id) -> AppResult<()> {
        let mut t = self.inner.write();
        if !t.routines.get(&id).is_some_and(|r| r.user_id == user_id) {
            return Err(AppError::NotFound("Routine"));
        }
        t.routines.remove(&id);
        let log_ids: Vec<Id> = t
            .logs
            .values()
            .filter(|l| l.routine_id == Some(id))
            .map(|l| l.id)
            .collect();
        for log_id in &log_ids {
            t.remove_log(*log_id);
        }
        t.refresh_product_stats(user_id);
        debug!(routine_id = id, cascaded_logs = log_ids.len(), "routine deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Routine logs
    // ------------------------------------------------------------------

    pub fn create_log(&self, user_id: Id, data: RoutineLogCreate) -> AppResult<RoutineLog> {
        let mut t = self.inner.write();
        if let Some(rid) = data.routine_id {
            if !t.routines.get(&rid).is_some_and(|r| r.user_id == user_id) {
                return Err(AppError::NotFound("Routine"));
            }
        }
        let id = t.next_id();
        let log = RoutineLog {
            id,
            user_id,
            routine_id: data.routine_id,
            date: data.date,
            time: data.time,
            products_used: data.products_used.unwrap_or_default(),
            wash_day: data.wash_day,
            styling_method: data.styling_method,
            drying_method: data.drying_method,
            time_spent: data.time_spent,
            notes: data.notes,
            photo_urls: data.photo_urls.unwrap_or_default(),
            created_at: Utc::now(),
            updated_at: None,
        };
        t.logs.insert(id, log.clone());
        t.refresh_product_stats(user_id);
        Ok(log)
    }

    /// Newest first, then `skip`/`limit`.
    pub fn logs(&self, user_id: Id, q: &LogQuery) -> Vec<RoutineLog> {
        let range = DateRange {
            start_date: q.start_date,
            end_date: q.end_date,
        };
        let t = self.inner.read();
        let mut out: Vec<RoutineLog> = t
            .logs
            .values()
            .filter(|l| l.user_id == user_id && range.contains(l.date))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out.into_iter().skip(q.skip).take(q.limit).collect()
    }

    pub fn log(&self, user_id: Id, id: Id) -> AppResult<RoutineLog> {
        self.inner
            .read()
            .owned_log(user_id, id)
            .cloned()
            .ok_or(AppError::NotFound("Routine log"))
    }

    pub fn update_log(&self, user_id: Id, id: Id, update: RoutineLogUpdate) -> AppResult<RoutineLog> {
        let mut t = self.inner.write();
        let l = t
            .logs
            .get_mut(&id)
            .filter(|l| l.user_id == user_id)
            .ok_or(AppError::NotFound("Routine log"))?;
        if let Some(v) = update.date {
            l.date = v;
        }
        if let Some(v) = update.time {
            l.time = Some(v);
        }
        if let Some(v) = update.products_used {
            l.products_used = v;
        }
        if let Some(v) = update.wash_day {
            l.wash_day = v;
        }
        if let Some(v) = update.styling_method {
            l.styling_method = Some(v);
        }
        if let Some(v) = update.drying_method {
            l.drying_method = Some(v);
        }
        if let Some(v) = update.time_spent {
            l.time_spent = Some(v);
        }
        if let Some(v) = update.notes {
            l.notes = Some(v);
        }
        if let Some(v) = update.photo_urls {
            l.photo_urls = v;
        }
        l.updated_at = Some(Utc::now());
        let log = l.clone();
        t.refresh_product_stats(user_id);
        Ok(log)
    }

    pub fn delete_log(&self, user_id: Id, id: Id) -> AppResult<()> {
        let mut t = self.inner.write();
        if t.owned_log(user_id, id).is_none() {
            return Err(AppError::NotFound("Routine log"));
        }
        t.remove_log(id);
        t.refresh_product_stats(user_id);
        Ok(())
    }

    pub fn count_logs(&self, user_id: Id) -> usize {
        self.inner
            .read()
            .logs
            .values()
            .filter(|l| l.user_id == user_id)
            .count()
    }

    // ------------------------------------------------------------------
    // Outcomes
    // ------------------------------------------------------------------

    pub fn create_outcome(&self, user_id: Id, data: OutcomeCreate) -> AppResult<Outcome> {
        let mut t = self.inner.write();
        if t.owned_log(user_id, data.routine_log_id).is_none() {
            return Err(AppError::NotFound("Routine log"));
        }
        if t.outcome_for_log(data.routine_log_id).is_some() {
            return Err(AppError::BadRequest(
                "Outcome already exists for this routine log".into(),
            ));
        }
        let id = t.next_id();
        let outcome = Outcome {
            id,
            routine_log_id: data.routine_log_id,
            frizz: data.frizz,
            definition: data.definition,
            softness: data.softness,
            hold_hours: data.hold_hours,
            overall_score: data.ratings().score(),
            notes: data.notes,
            rated_at: Utc::now(),
        };
        t.outcomes.insert(id, outcome.clone());
        t.refresh_product_stats(user_id);
        Ok(outcome)
    }

    pub fn outcomes(&self, user_id: Id) -> Vec<Outcome> {
        let t = self.inner.read();
        t.outcomes
            .values()
            .filter(|o| t.owned_log(user_id, o.routine_log_id).is_some())
            .cloned()
            .collect()
    }

    pub fn outcome(&self, user_id: Id, id: Id) -> AppResult<Outcome> {
        let t = self.inner.read();
        if !t.owns_outcome(user_id, id) {
            return Err(AppError::NotFound("Outcome"));
        }
        t.outcomes
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound("Outcome"))
    }

    /// Applies the update and rescores when any rating input changed.
    pub fn update_outcome(&self, user_id: Id, id: Id, update: OutcomeUpdate) -> AppResult<Outcome> {
        let mut t = self.inner.write();
        if !t.owns_outcome(user_id, id) {
            return Err(AppError::NotFound("Outcome"));
        }
        let rescore = update.touches_ratings();
        let o = t.outcomes.get_mut(&id).ok_or(AppError::NotFound("Outcome"))?;
        if let Some(v) = update.frizz {
            o.frizz = v;
        }
        if let Some(v) = update.definition {
            o.definition = v;
        }
        if let Some(v) = update.softness {
            o.softness = v;
        }
        if let Some(v) = update.hold_hours {
            o.hold_hours = v;
        }
        if let Some(v) = update.notes {
            o.notes = v;
        }
        if rescore {
            o.overall_score = overall_score(o.frizz, o.definition, o.softness, o.hold_hours);
        }
        let outcome = o.clone();
        if rescore {
            t.refresh_product_stats(user_id);
        }
        Ok(outcome)
    }

    pub fn delete_outcome(&self, user_id: Id, id: Id) -> AppResult<()> {
        let mut t = self.inner.write();
        if !t.owns_outcome(user_id, id) {
            return Err(AppError::NotFound("Outcome"));
        }
        t.outcomes.remove(&id);
        t.refresh_product_stats(user_id);
        Ok(())
    }

    /// The user's logs joined with their outcomes, in log order.
    pub fn rated_logs(&self, user_id: Id) -> Vec<RatedLog> {
        let t = self.inner.read();
        let by_log: BTreeMap<Id, &Outcome> = t
            .outcomes
            .values()
            .map(|o| (o.routine_log_id, o))
            .collect();
        t.logs
            .values()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                by_log.get(&l.id).map(|o| RatedLog {
                    log_id: l.id,
                    routine_id: l.routine_id,
                    date: l.date,
                    ratings: o.ratings(),
                    overall_score: o.overall_score,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Weather
    // ------------------------------------------------------------------

    pub fn find_weather(&self, user_id: Id, date: NaiveDate, location: &str) -> Option<WeatherRecord> {
        self.inner
            .read()
            .weather
            .values()
            .find(|w| w.user_id == user_id && w.date == date && w.location == location)
            .cloned()
    }

    /// Store a reading unless one already exists for the same (user, date,
    /// location). Returns the stored row and whether it was inserted.
    pub fn insert_weather(&self, mut record: WeatherRecord) -> (WeatherRecord, bool) {
        let mut t = self.inner.write();
        if let Some(existing) = t.weather.values().find(|w| {
            w.user_id == record.user_id && w.date == record.date && w.location == record.location
        }) {
            return (existing.clone(), false);
        }
        record.id = t.next_id();
        record.created_at = Utc::now();
        t.weather.insert(record.id, record.clone());
        (record, true)
    }

    /// Newest first.
    pub fn weather(&self, user_id: Id, range: &DateRange) -> Vec<WeatherRecord> {
        let mut out: Vec<WeatherRecord> = self
            .inner
            .read()
            .weather
            .values()
            .filter(|w| w.user_id == user_id && range.contains(w.date))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out
    }

    pub fn weather_record(&self, user_id: Id, id: Id) -> AppResult<WeatherRecord> {
        self.inner
            .read()
            .weather
            .get(&id)
            .filter(|w| w.user_id == user_id)
            .cloned()
            .ok_or(AppError::NotFound("Weather data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductType, ProductsUsed, RoutineStep};

    fn store_with_user() -> (Store, Id) {
        let s = Store::new();
        let u = s
            .create_user("Curly@Example.com", "hash".into(), HairProfile::default())
            .unwrap();
        (s, u.id)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn log_input(date: NaiveDate, routine_id: Option<Id>, products: &[Id]) -> RoutineLogCreate {
        let mut used = ProductsUsed::new();
        if !products.is_empty() {
            used.insert("style".into(), products.to_vec());
        }
        RoutineLogCreate {
            routine_id,
            date,
            time: None,
            products_used: Some(used),
            wash_day: true,
            styling_method: None,
            drying_method: None,
            time_spent: None,
            notes: None,
            photo_urls: None,
        }
    }

    fn outcome_input(log_id: Id, f: u8, d: u8, s: u8) -> OutcomeCreate {
        OutcomeCreate {
            routine_log_id: log_id,
            frizz: f,
            definition: d,
            softness: s,
            hold_hours: None,
            notes: None,
        }
    }

    fn routine_input(name: &str) -> RoutineCreate {
        RoutineCreate {
            name: name.into(),
            is_template: true,
            is_public: false,
            steps: vec![RoutineStep {
                step_type: "cleanse".into(),
                product_id: None,
                order: 1,
                notes: None,
            }],
            method_tags: None,
            drying_method: None,
        }
    }

    #[test]
    fn emails_are_unique_case_insensitively() {
        let (s, _) = store_with_user();
        let err = s
            .create_user("curly@example.COM", "h".into(), HairProfile::default())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(s.user_by_email(" CURLY@example.com ").is_some());
    }

    #[test]
    fn other_users_rows_are_not_found() {
        let (s, alice) = store_with_user();
        let bob = s
            .create_user("bob@example.com", "h".into(), HairProfile::default())
            .unwrap()
            .id;
        let r = s.create_routine(alice, routine_input("Wash day"));
        assert!(matches!(s.routine(bob, r.id), Err(AppError::NotFound("Routine"))));
        assert!(s.delete_routine(bob, r.id).is_err());
        assert!(s.routines(bob).is_empty());

        // bob cannot log against alice's routine
        assert!(s.create_log(bob, log_input(date(1), Some(r.id), &[])).is_err());
    }

    #[test]
    fn outcome_is_scored_on_create_and_rescored_on_update() {
        let (s, u) = store_with_user();
        let log = s.create_log(u, log_input(date(1), None, &[])).unwrap();
        let o = s.create_outcome(u, outcome_input(log.id, 1, 5, 5)).unwrap();
        assert_eq!(o.overall_score, overall_score(1, 5, 5, None));

        let dup = s.create_outcome(u, outcome_input(log.id, 3, 3, 3));
        assert!(matches!(dup, Err(AppError::BadRequest(_))));

        let o2 = s
            .update_outcome(
                u,
                o.id,
                OutcomeUpdate {
                    frizz: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(o2.overall_score, overall_score(5, 5, 5, None));

        let o3 = s
            .update_outcome(
                u,
                o.id,
                OutcomeUpdate {
                    notes: Some(Some("humid".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(o3.overall_score, o2.overall_score);
        assert_eq!(o3.notes.as_deref(), Some("humid"));
    }

    #[test]
    fn deleting_a_routine_cascades_to_logs_and_outcomes() {
        let (s, u) = store_with_user();
        let r = s.create_routine(u, routine_input("Braid out"));
        let log = s.create_log(u, log_input(date(2), Some(r.id), &[])).unwrap();
        s.create_outcome(u, outcome_input(log.id, 2, 4, 4)).unwrap();
        let adhoc = s.create_log(u, log_input(date(3), None, &[])).unwrap();

        s.delete_routine(u, r.id).unwrap();
        assert!(s.log(u, log.id).is_err());
        assert!(s.outcomes(u).is_empty());
        assert!(s.log(u, adhoc.id).is_ok());
    }

    #[test]
    fn product_stats_follow_logs_and_outcomes() {
        let (s, u) = store_with_user();
        let p = s.create_product(
            u,
            ProductCreate {
                brand: "Acme".into(),
                name: "Gel".into(),
                kind: ProductType::Gel,
                ingredients: None,
                notes: None,
            },
        );
        let l1 = s.create_log(u, log_input(date(1), None, &[p.id])).unwrap();
        let l2 = s.create_log(u, log_input(date(2), None, &[p.id])).unwrap();
        s.create_log(u, log_input(date(3), None, &[p.id])).unwrap();
        s.create_log(u, log_input(date(4), None, &[])).unwrap();

        s.create_outcome(u, outcome_input(l1.id, 1, 5, 5)).unwrap();
        s.create_outcome(u, outcome_input(l2.id, 5, 1, 1)).unwrap();

        let p = s.product(u, p.id).unwrap();
        assert_eq!(p.usage_count, 3);
        assert_eq!(p.success_rate, 0.5);

        s.delete_log(u, l2.id).unwrap();
        let p = s.product(u, p.id).unwrap();
        assert_eq!(p.usage_count, 2);
        assert_eq!(p.success_rate, 1.0);
    }

    #[test]
    fn logs_list_newest_first_with_paging_and_range() {
        let (s, u) = store_with_user();
        for d in [3, 1, 5, 2, 4] {
            s.create_log(u, log_input(date(d), None, &[])).unwrap();
        }
        let all = s.logs(u, &LogQuery::default());
        let dates: Vec<u32> = all.iter().map(|l| chrono::Datelike::day(&l.date)).collect();
        assert_eq!(dates, vec![5, 4, 3, 2, 1]);

        let page = s.logs(
            u,
            &LogQuery {
                skip: 1,
                limit: 2,
                start_date: Some(date(2)),
                end_date: None,
            },
        );
        let dates: Vec<u32> = page.iter().map(|l| chrono::Datelike::day(&l.date)).collect();
        assert_eq!(dates, vec![4, 3]);
    }

    #[test]
    fn rated_logs_only_include_logs_with_outcomes() {
        let (s, u) = store_with_user();
        let l1 = s.create_log(u, log_input(date(1), None, &[])).unwrap();
        s.create_log(u, log_input(date(2), None, &[])).unwrap();
        s.create_outcome(u, outcome_input(l1.id, 2, 3, 4)).unwrap();
        let rows = s.rated_logs(u);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].log_id, l1.id);
        assert_eq!(rows[0].ratings.softness, 4);
        assert_eq!(s.count_logs(u), 2);
    }

    #[test]
    fn star_toggles() {
        let (s, u) = store_with_user();
        let p = s.create_product(
            u,
            ProductCreate {
                brand: "Acme".into(),
                name: "Oil".into(),
                kind: ProductType::Oil,
                ingredients: Some(vec!["jojoba".into()]),
                notes: None,
            },
        );
        assert!(s.toggle_star(u, p.id).unwrap().is_starred);
        assert_eq!(s.products(u, true).len(), 1);
        assert!(!s.toggle_star(u, p.id).unwrap().is_starred);
        assert!(s.products(u, true).is_empty());
    }

    fn reading(user_id: Id, date: NaiveDate, location: &str, humidity: f64) -> WeatherRecord {
        WeatherRecord {
            id: 0,
            user_id,
            date,
            location: location.into(),
            humidity,
            dew_point: 12.0,
            temperature: 20.0,
            wind_speed: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn second_reading_for_same_day_and_place_keeps_the_first() {
        let (s, u) = store_with_user();
        let (first, inserted) = s.insert_weather(reading(u, date(5), "Austin", 70.0));
        assert!(inserted);

        // a racing fetch that finished later
        let (again, inserted) = s.insert_weather(reading(u, date(5), "Austin", 30.0));
        assert!(!inserted);
        assert_eq!(again.id, first.id);
        assert_eq!(again.humidity, 70.0);
        assert_eq!(s.weather(u, &DateRange::default()).len(), 1);

        let (_, inserted) = s.insert_weather(reading(u, date(5), "Boston", 30.0));
        assert!(inserted);
        assert_eq!(s.weather(u, &DateRange::default()).len(), 2);
    }
}
