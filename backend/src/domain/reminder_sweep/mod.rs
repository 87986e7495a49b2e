//! Daily reminder sweep.
//!
//! One run scans every user holding a delivery token. A user is reminded
//! when their local clock is inside the reminder hour, they have not been
//! reminded on this local date yet, and at least one medicine still has an
//! untaken dose today. Each user is processed in isolation: a failure is
//! logged and counted, and the run moves on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::local_time::{LocalSlotContext, resolve};
use crate::domain::ports::{
    NotificationDelivery, NotificationDeliveryError, PushNotification, RoutineRepository,
    RoutineRepositoryError, UserPersistenceError, UserRepository,
};
use crate::domain::reconciliation::has_outstanding_dose;
use crate::domain::service_support::map_user_error;
use crate::domain::{DeliveryToken, Error, Routine, User};

mod scheduler;

pub use scheduler::{ReminderScheduler, ScheduledSweep};

/// Reminder sweep settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSweepConfig {
    /// Local hour (0-23) at which users are reminded.
    pub reminder_hour: u32,
    /// Notification title.
    pub title: String,
}

impl Default for ReminderSweepConfig {
    fn default() -> Self {
        Self {
            reminder_hour: 10,
            title: "Medication Reminder".to_owned(),
        }
    }
}

/// Port bundle required by the sweep.
pub struct ReminderSweepPorts {
    pub users: Arc<dyn UserRepository>,
    pub routines: Arc<dyn RoutineRepository>,
    pub delivery: Arc<dyn NotificationDelivery>,
}

/// What happened to one user during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSweepOutcome {
    /// A notification reached at least one device.
    Notified { delivered: usize, pruned: usize },
    /// Delivery was attempted but no device accepted it.
    Undelivered { pruned: usize },
    OutsideReminderHour,
    AlreadyReminded,
    NothingDue,
    UnresolvableTimeZone,
}

/// Per-user failures that are logged and skipped.
#[derive(Debug, thiserror::Error)]
enum UserSweepError {
    #[error(transparent)]
    Routines(#[from] RoutineRepositoryError),
    #[error(transparent)]
    Delivery(#[from] NotificationDeliveryError),
    #[error(transparent)]
    Users(#[from] UserPersistenceError),
}

impl UserSweepError {
    /// Whether the next sweep in the reminder hour is likely to succeed.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Routines(err) => err.is_retryable(),
            Self::Delivery(err) => err.is_retryable(),
            Self::Users(err) => err.is_retryable(),
        }
    }
}

/// Counters for one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub notified: usize,
    pub undelivered: usize,
    pub outside_reminder_hour: usize,
    pub already_reminded: usize,
    pub nothing_due: usize,
    pub unresolvable_time_zone: usize,
    pub failed: usize,
    pub pruned_tokens: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: &UserSweepOutcome) {
        match outcome {
            UserSweepOutcome::Notified { pruned, .. } => {
                self.notified += 1;
                self.pruned_tokens += pruned;
            }
            UserSweepOutcome::Undelivered { pruned } => {
                self.undelivered += 1;
                self.pruned_tokens += pruned;
            }
            UserSweepOutcome::OutsideReminderHour => self.outside_reminder_hour += 1,
            UserSweepOutcome::AlreadyReminded => self.already_reminded += 1,
            UserSweepOutcome::NothingDue => self.nothing_due += 1,
            UserSweepOutcome::UnresolvableTimeZone => self.unresolvable_time_zone += 1,
        }
    }
}

/// Names of medicines with an untaken dose today, first occurrence first.
pub fn due_medicine_names(routines: &[Routine], context: &LocalSlotContext) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for routine in routines {
        for entry in routine.entries() {
            let due = has_outstanding_dose(
                entry,
                context.weekday,
                routine.taken(),
                &context.local_date,
            );
            let name = entry.medicine_name.as_ref();
            if due && !names.iter().any(|seen| seen == name) {
                names.push(name.to_owned());
            }
        }
    }
    names
}

/// Notification body listing the due medicines.
pub fn reminder_body(names: &[String]) -> String {
    format!("Your today's medicines: {}.", names.join(", "))
}

/// Recurring daily reminder sweep.
pub struct ReminderSweep {
    users: Arc<dyn UserRepository>,
    routines: Arc<dyn RoutineRepository>,
    delivery: Arc<dyn NotificationDelivery>,
    clock: Arc<dyn Clock>,
    config: ReminderSweepConfig,
}

impl ReminderSweep {
    pub fn new(ports: ReminderSweepPorts, clock: Arc<dyn Clock>, config: ReminderSweepConfig) -> Self {
        let ReminderSweepPorts {
            users,
            routines,
            delivery,
        } = ports;
        Self {
            users,
            routines,
            delivery,
            clock,
            config,
        }
    }

    /// Run one sweep over every user with a delivery token.
    ///
    /// Fails only when the user list cannot be loaded.
    pub async fn run_once(&self) -> Result<SweepReport, Error> {
        let now = self.clock.utc();
        let users = self
            .users
            .list_with_delivery_tokens()
            .await
            .map_err(map_user_error)?;

        let mut report = SweepReport::default();
        for user in &users {
            report.scanned += 1;
            match self.sweep_user(user, now).await {
                Ok(outcome) => report.record(&outcome),
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        user_id = %user.id(),
                        error = %err,
                        retryable = err.is_retryable(),
                        "reminder sweep failed for user"
                    );
                }
            }
        }

        info!(
            scanned = report.scanned,
            notified = report.notified,
            failed = report.failed,
            pruned_tokens = report.pruned_tokens,
            "reminder sweep finished"
        );
        Ok(report)
    }

    async fn sweep_user(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<UserSweepOutcome, UserSweepError> {
        let context = match resolve(now, user.time_zone()) {
            Ok(context) => context,
            Err(err) => {
                warn!(user_id = %user.id(), zone = %err.zone, "skipping user with unresolvable time zone");
                return Ok(UserSweepOutcome::UnresolvableTimeZone);
            }
        };
        if context.local_hour != self.config.reminder_hour {
            return Ok(UserSweepOutcome::OutsideReminderHour);
        }
        if user.last_reminded_on() == Some(context.local_date) {
            return Ok(UserSweepOutcome::AlreadyReminded);
        }

        let routines = self.routines.list_for_user(user.id()).await?;
        let names = due_medicine_names(&routines, &context);
        if names.is_empty() {
            return Ok(UserSweepOutcome::NothingDue);
        }

        let notification = PushNotification {
            title: self.config.title.clone(),
            body: reminder_body(&names),
        };
        let outcomes = self
            .delivery
            .deliver(user.delivery_tokens(), &notification)
            .await?;

        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
        let invalid: Vec<DeliveryToken> = outcomes
            .iter()
            .filter(|o| o.token_is_invalid())
            .map(|o| o.token.clone())
            .collect();
        let pruned = self.prune(user, &invalid).await;

        if delivered == 0 {
            return Ok(UserSweepOutcome::Undelivered { pruned });
        }
        self.users
            .mark_reminded(user.id(), context.local_date)
            .await?;
        info!(
            user_id = %user.id(),
            local_date = %context.local_date,
            medicines = names.len(),
            delivered,
            "reminder sent"
        );
        Ok(UserSweepOutcome::Notified { delivered, pruned })
    }

    /// Remove permanently invalid tokens; a failure here does not fail the user.
    async fn prune(&self, user: &User, invalid: &[DeliveryToken]) -> usize {
        if invalid.is_empty() {
            return 0;
        }
        match self.users.remove_delivery_tokens(user.id(), invalid).await {
            Ok(()) => {
                info!(user_id = %user.id(), count = invalid.len(), "pruned invalid delivery tokens");
                invalid.len()
            }
            Err(err) => {
                warn!(user_id = %user.id(), error = %err, "failed to prune delivery tokens");
                0
            }
        }
    }
}
