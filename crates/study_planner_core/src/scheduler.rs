//! crates/study_planner_core/src/scheduler.rs
//!
//! Greedy single-pass allocation of work items onto the availability calendar.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calendar::AvailabilityCalendar;
use crate::error::{PlannerError, PlannerResult};
use crate::resolver::WorkItem;

/// Default limit on how far past the start date a schedule may reach (five years).
pub const DEFAULT_HORIZON_DAYS: i64 = 365 * 5;

/// Hours of one work item placed on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub date: NaiveDate,
    pub technology_id: Uuid,
    pub subtopic_id: Uuid,
    pub hours: Decimal,
    /// Position in the scheduler output, starting at zero.
    pub sequence: usize,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    horizon_days: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_DAYS)
    }
}

impl Scheduler {
    pub fn new(horizon_days: i64) -> Self {
        Self { horizon_days }
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    /// Places every work item, in order, on consecutive study days.
    ///
    /// Each item takes `min(item remaining, day remaining)` from the current day.
    /// A day is left once its capacity is spent; an item is left once it is fully
    /// placed, and the next item continues on the same day if capacity remains.
    pub fn schedule(
        &self,
        calendar: &AvailabilityCalendar,
        items: &[WorkItem],
    ) -> PlannerResult<Vec<Allocation>> {
        let mut allocations = Vec::new();
        if items.is_empty() {
            return Ok(allocations);
        }

        let last_allowed = u64::try_from(self.horizon_days)
            .ok()
            .and_then(|days| calendar.start_date().checked_add_days(Days::new(days)))
            .ok_or_else(|| {
                PlannerError::Allocation(format!(
                    "A {} day horizon from {} is outside the supported date range",
                    self.horizon_days,
                    calendar.start_date()
                ))
            })?;
        let mut days = calendar.days();
        let mut current: Option<(NaiveDate, Decimal)> = None;

        for item in items {
            if item.hours_required <= Decimal::ZERO {
                return Err(PlannerError::Validation(format!(
                    "Subtopic {} has non-positive hours_required",
                    item.subtopic_id
                )));
            }

            let mut remaining = item.hours_required;
            while remaining > Decimal::ZERO {
                let (date, capacity) = match current {
                    Some(day) if day.1 > Decimal::ZERO => day,
                    _ => days.next().ok_or_else(|| {
                        PlannerError::Allocation("Calendar ran out of dates".to_string())
                    })?,
                };
                if date > last_allowed {
                    return Err(PlannerError::Allocation(format!(
                        "Schedule would extend past {} ({} days after the start date)",
                        last_allowed, self.horizon_days
                    )));
                }

                let hours = remaining.min(capacity);
                allocations.push(Allocation {
                    date,
                    technology_id: item.technology_id,
                    subtopic_id: item.subtopic_id,
                    hours,
                    sequence: allocations.len(),
                });
                remaining -= hours;
                current = Some((date, capacity - hours));
            }
        }

        Ok(allocations)
    }
}
