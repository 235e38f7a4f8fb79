// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of LoadShift.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loadshift_types::{
    DeviceSchedule, DeviceShiftSuggestion, OptimalWindow, PriceSlot, ScheduleRequest,
    ScheduleStatus, clamp_priority,
};
use tracing::{info, warn};

use crate::error::{Result, ScheduleError};
use crate::optimizer::{self, NoWindow};
use crate::store::{NewSchedule, ScheduleStore};
use crate::timeline::PriceTimeline;

/// Default cap for `get_schedules`
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Entry point for callers: picks run windows and records them.
///
/// Scheduling never fails for lack of price data; without a usable window the
/// run is scheduled for "now" with zero estimated cost.
#[derive(Debug)]
pub struct SchedulingService {
    timeline: Arc<PriceTimeline>,
    store: ScheduleStore,
}

impl SchedulingService {
    pub fn new(timeline: Arc<PriceTimeline>, store: ScheduleStore) -> Self {
        Self { timeline, store }
    }

    pub fn timeline(&self) -> &Arc<PriceTimeline> {
        &self.timeline
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn set_price_timeline(&self, slots: Vec<PriceSlot>) {
        self.timeline.set(slots);
    }

    pub fn find_optimal_window(
        &self,
        duration_hours: f64,
        within_hours: f64,
    ) -> std::result::Result<OptimalWindow, NoWindow> {
        self.find_optimal_window_at(duration_hours, within_hours, Utc::now())
    }

    pub fn find_optimal_window_at(
        &self,
        duration_hours: f64,
        within_hours: f64,
        now: DateTime<Utc>,
    ) -> std::result::Result<OptimalWindow, NoWindow> {
        optimizer::find_optimal_window(&self.timeline.snapshot(), duration_hours, within_hours, now)
    }

    pub fn suggest_device_shift(
        &self,
        consumption_kwh: f64,
        duration_hours: f64,
    ) -> DeviceShiftSuggestion {
        optimizer::suggest_device_shift(
            &self.timeline.snapshot(),
            consumption_kwh,
            duration_hours,
            Utc::now(),
        )
    }

    pub fn schedule_device(&self, request: &ScheduleRequest) -> Result<DeviceSchedule> {
        self.schedule_device_at(request, Utc::now())
    }

    /// Pick the cheapest window for `request` as seen at `now` and persist it.
    ///
    /// Identical requests always create separate schedules.
    pub fn schedule_device_at(
        &self,
        request: &ScheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<DeviceSchedule> {
        validate(request)?;
        let priority = clamp_priority(request.priority);

        let suggestion = optimizer::suggest_device_shift_within(
            &self.timeline.snapshot(),
            request.consumption_kwh,
            request.duration_hours,
            request.within_hours,
            now,
        );

        let (window_start, window_end, estimated_cost) = match &suggestion.window {
            Some(window) => (window.start, window.end, suggestion.cost_optimal),
            None => {
                warn!(
                    device = %request.device_ref,
                    reason = %suggestion.message,
                    "No usable price window, scheduling run for now"
                );
                let end = now
                    .checked_add_signed(optimizer::hours_to_duration(request.duration_hours))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                (now, end, 0.0)
            }
        };

        let schedule = self.store.create(NewSchedule {
            device_ref: request.device_ref.clone(),
            consumption_kwh: request.consumption_kwh,
            duration_hours: request.duration_hours,
            priority,
            window_start,
            window_end,
            estimated_cost,
        })?;

        info!(
            id = %schedule.id,
            savings = suggestion.estimated_savings,
            "Device run scheduled"
        );
        Ok(schedule)
    }

    pub fn get_schedules(
        &self,
        status: Option<ScheduleStatus>,
        limit: usize,
    ) -> Result<Vec<DeviceSchedule>> {
        self.store.list(status, limit)
    }

    pub fn get_schedule(&self, id: &str) -> Result<DeviceSchedule> {
        self.store.get(id)
    }

    pub fn cancel_schedule(&self, id: &str) -> Result<DeviceSchedule> {
        self.store.cancel(id)
    }

    pub fn complete_schedule(&self, id: &str) -> Result<DeviceSchedule> {
        self.store.complete(id)
    }
}

fn validate(request: &ScheduleRequest) -> Result<()> {
    if request.device_ref.trim().is_empty() {
        return Err(ScheduleError::InvalidRequest(
            "device_ref must not be empty".to_owned(),
        ));
    }
    if !request.duration_hours.is_finite() || request.duration_hours <= 0.0 {
        return Err(ScheduleError::InvalidRequest(format!(
            "duration_hours must be positive, got {}",
            request.duration_hours
        )));
    }
    if !request.consumption_kwh.is_finite() || request.consumption_kwh < 0.0 {
        return Err(ScheduleError::InvalidRequest(format!(
            "consumption_kwh must not be negative, got {}",
            request.consumption_kwh
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::{TempDir, tempdir};

    const EPS: f64 = 1e-9;

    fn service() -> (TempDir, SchedulingService) {
        let dir = tempdir().unwrap();
        let store = ScheduleStore::open(dir.path().join("schedules.db")).unwrap();
        (dir, SchedulingService::new(Arc::new(PriceTimeline::new()), store))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 6, 0, 0).unwrap()
    }

    fn hourly(start: DateTime<Utc>, prices: &[f64]) -> Vec<PriceSlot> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let s = start + Duration::hours(i as i64);
                PriceSlot::new(s, s + Duration::hours(1), p)
            })
            .collect()
    }

    fn request(priority: i64) -> ScheduleRequest {
        ScheduleRequest {
            device_ref: "switch.dishwasher".to_owned(),
            consumption_kwh: 1.2,
            duration_hours: 2.0,
            priority,
            within_hours: 24.0,
        }
    }

    #[test]
    fn test_schedules_in_cheapest_window() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t, &[0.30, 0.10, 0.15, 0.40]));

        let schedule = service.schedule_device_at(&request(2), t).unwrap();
        assert_eq!(schedule.window_start, t + Duration::hours(1));
        assert_eq!(schedule.window_end, t + Duration::hours(3));
        assert!((schedule.estimated_cost - 0.125 * 1.2).abs() < EPS);
        assert_eq!(schedule.status, ScheduleStatus::Pending);
        assert_eq!(schedule.priority, 2);
    }

    #[test]
    fn test_falls_back_to_now_without_prices() {
        let (_dir, service) = service();
        let t = now();

        let schedule = service.schedule_device_at(&request(3), t).unwrap();
        assert_eq!(schedule.window_start, t);
        assert_eq!(schedule.window_end, t + Duration::hours(2));
        assert!(schedule.estimated_cost.abs() < EPS);
    }

    #[test]
    fn test_falls_back_when_horizon_has_no_data() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t - Duration::hours(10), &[0.1, 0.2]));

        let schedule = service.schedule_device_at(&request(3), t).unwrap();
        assert_eq!(schedule.window_start, t);
        assert!(schedule.estimated_cost.abs() < EPS);
    }

    #[test]
    fn test_falls_back_when_horizon_too_short() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t, &[0.05]));
        assert!(matches!(
            service.find_optimal_window_at(2.0, 24.0, t),
            Err(NoWindow::HorizonTooShort {
                needed: 2,
                available: 1
            })
        ));

        let schedule = service.schedule_device_at(&request(3), t).unwrap();
        assert_eq!(schedule.window_start, t);
        assert_eq!(schedule.window_end, t + Duration::hours(2));
        assert!(schedule.estimated_cost.abs() < EPS);
    }

    #[test]
    fn test_non_finite_price_falls_back_instead_of_failing() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t, &[0.2, f64::NAN, 0.1, 0.3]));

        let mut req = request(3);
        req.consumption_kwh = 0.0;
        let schedule = service.schedule_device_at(&req, t).unwrap();
        assert_eq!(schedule.window_start, t);
        assert!(schedule.estimated_cost.is_finite());
        assert_eq!(service.get_schedule(&schedule.id).unwrap(), schedule);
    }

    #[test]
    fn test_priority_is_clamped() {
        let (_dir, service) = service();
        assert_eq!(service.schedule_device_at(&request(0), now()).unwrap().priority, 1);
        assert_eq!(service.schedule_device_at(&request(42), now()).unwrap().priority, 5);
    }

    #[test]
    fn test_within_hours_limits_search() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t, &[0.3, 0.3, 0.3, 0.3, 0.01, 0.01]));

        let mut req = request(3);
        req.within_hours = 4.0;
        let narrow = service.schedule_device_at(&req, t).unwrap();
        assert_eq!(narrow.window_start, t);

        req.within_hours = 6.0;
        let wide = service.schedule_device_at(&req, t).unwrap();
        assert_eq!(wide.window_start, t + Duration::hours(4));
    }

    #[test]
    fn test_identical_requests_are_not_deduplicated() {
        let (_dir, service) = service();
        let t = now();
        service.set_price_timeline(hourly(t, &[0.2, 0.1, 0.3]));

        let first = service.schedule_device_at(&request(3), t).unwrap();
        let second = service.schedule_device_at(&request(3), t).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(service.get_schedules(None, DEFAULT_LIST_LIMIT).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let (_dir, service) = service();

        let mut req = request(3);
        req.duration_hours = 0.0;
        assert!(matches!(
            service.schedule_device_at(&req, now()),
            Err(ScheduleError::InvalidRequest(_))
        ));

        let mut req = request(3);
        req.consumption_kwh = f64::NAN;
        assert!(service.schedule_device_at(&req, now()).is_err());

        let mut req = request(3);
        req.device_ref = "  ".to_owned();
        assert!(service.schedule_device_at(&req, now()).is_err());

        assert!(service.get_schedules(None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_pass_through_operations() {
        let (_dir, service) = service();
        let a = service.schedule_device_at(&request(1), now()).unwrap();
        let b = service.schedule_device_at(&request(1), now()).unwrap();

        assert_eq!(
            service.cancel_schedule(&a.id).unwrap().status,
            ScheduleStatus::Cancelled
        );
        assert_eq!(
            service.complete_schedule(&b.id).unwrap().status,
            ScheduleStatus::Completed
        );
        assert!(matches!(
            service.cancel_schedule(&b.id),
            Err(ScheduleError::NotPending { .. })
        ));
        assert!(service.get_schedule("missing").unwrap_err().is_not_found());

        let completed = service
            .get_schedules(Some(ScheduleStatus::Completed), DEFAULT_LIST_LIMIT)
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, b.id);
    }

    #[test]
    fn test_find_optimal_window_reports_reason() {
        let (_dir, service) = service();
        let t = now();
        assert_eq!(
            service.find_optimal_window_at(1.0, 24.0, t),
            Err(NoWindow::NoPriceData)
        );

        service.set_price_timeline(hourly(t + Duration::hours(48), &[0.1]));
        assert_eq!(
            service.find_optimal_window_at(1.0, 24.0, t),
            Err(NoWindow::NoDataInHorizon)
        );
    }
}
