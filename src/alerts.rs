//! Alert derivation: a pure function of the current job/meter/customer
//! collections, re-run on demand. Every run produces the full set of
//! currently-true alerts; the store replaces its collection wholesale.

use chrono::{NaiveDateTime, NaiveTime};

use crate::models::{
    format_money, Alert, AlertSeverity, AlertType, Customer, Job, MeterApplication, MeterStatus,
    MeterType, PipelineStage,
};

pub const PRE_METER_PENDING_DAYS: i64 = 7;
pub const INSTALL_WARNING_DAYS: i64 = 3;
pub const POST_METER_DEADLINE_DAYS: i64 = 2;
pub const INVOICE_OVERDUE_DAYS: i64 = 14;

const MS_PER_DAY: i64 = 86_400_000;

/// Whole days from `from` to `to`, floor of the millisecond difference.
/// Anything under 24h counts as 0 days; a partial day in the past rounds
/// down to -1.
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_milliseconds().div_euclid(MS_PER_DAY)
}

fn midnight(date: chrono::NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn first_meter<'a>(
    meters: &'a [MeterApplication],
    job_id: &str,
    kind: MeterType,
) -> Option<&'a MeterApplication> {
    // First match in insertion order; duplicate submissions are legal but
    // only the first one drives gating and alerting.
    meters.iter().find(|m| m.job_id == job_id && m.meter_type == kind)
}

/// Recompute all currently-true alert conditions. Alert ids are derived
/// from the job id, so a still-true condition regenerates the same id on
/// every run.
pub fn derive(
    jobs: &[Job],
    meters: &[MeterApplication],
    customers: &[Customer],
    now: NaiveDateTime,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for job in jobs {
        let name = customers
            .iter()
            .find(|c| c.id == job.customer_id)
            .map_or("Unknown", |c| c.name.as_str());

        let pre_meter = first_meter(meters, &job.id, MeterType::PreMeter);

        // Pre-meter pending too long
        if let Some(pm) = pre_meter {
            if pm.status == MeterStatus::Pending {
                let days_pending = days_between(midnight(pm.date_submitted), now);
                if days_pending > PRE_METER_PENDING_DAYS {
                    alerts.push(Alert {
                        id: format!("alert_pm_{}", job.id),
                        job_id: job.id.clone(),
                        alert_type: AlertType::PreMeterPending,
                        severity: AlertSeverity::High,
                        message: format!("Pre-meter pending {days_pending} days — {name}"),
                        created_at: now,
                        resolved: false,
                    });
                }
            }
        }

        // Install imminent without pre-meter approval
        if let Some(install_date) = job.install_date {
            let days_to_install = days_between(now, midnight(install_date));
            let approved = pre_meter.is_some_and(|m| m.status == MeterStatus::Approved);
            if (0..=INSTALL_WARNING_DAYS).contains(&days_to_install) && !approved {
                alerts.push(Alert {
                    id: format!("alert_inst_{}", job.id),
                    job_id: job.id.clone(),
                    alert_type: AlertType::InstallPreMeterRisk,
                    severity: AlertSeverity::High,
                    message: format!(
                        "Install in {days_to_install} days, pre-meter not approved — {name}"
                    ),
                    created_at: now,
                    resolved: false,
                });
            }
        }

        // Post-meter not submitted after install
        if job.pipeline_stage == PipelineStage::Installed {
            if let Some(install_date) = job.install_date {
                let days_since_install = days_between(midnight(install_date), now);
                let post_meter = first_meter(meters, &job.id, MeterType::PostMeter);
                if days_since_install > POST_METER_DEADLINE_DAYS && post_meter.is_none() {
                    alerts.push(Alert {
                        id: format!("alert_postm_{}", job.id),
                        job_id: job.id.clone(),
                        alert_type: AlertType::PostMeterLate,
                        severity: AlertSeverity::Medium,
                        message: format!(
                            "Post-meter not submitted {days_since_install} days after install — {name}"
                        ),
                        created_at: now,
                        resolved: false,
                    });
                }
            }
        }

        // Invoice overdue
        if job.invoice_status == crate::models::InvoiceStatus::Invoiced {
            if let Some(invoice_date) = job.invoice_date {
                let days_since_invoice = days_between(midnight(invoice_date), now);
                if days_since_invoice > INVOICE_OVERDUE_DAYS {
                    alerts.push(Alert {
                        id: format!("alert_inv_{}", job.id),
                        job_id: job.id.clone(),
                        alert_type: AlertType::InvoiceOverdue,
                        severity: AlertSeverity::High,
                        message: format!(
                            "Invoice overdue {days_since_invoice} days — {name} {}",
                            format_money(job.project_price)
                        ),
                        created_at: now,
                        resolved: false,
                    });
                }
            }
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, SystemType};
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
    }

    fn day(offset: i64) -> NaiveDate {
        now().date() + Duration::days(offset)
    }

    fn test_job(id: &str, stage: PipelineStage) -> Job {
        Job {
            id: id.to_string(),
            customer_id: "c1".to_string(),
            system_type: SystemType::Solar,
            system_size_kw: 6.6,
            contract_signed: true,
            deposit_paid: true,
            deposit_amount: 2000,
            deposit_date: Some(day(-30)),
            project_price: 19000,
            eta_completion_date: day(10),
            pipeline_stage: stage,
            install_date: None,
            assigned_team: "Team 1".to_string(),
            job_status: stage.label().to_string(),
            invoice_status: InvoiceStatus::NotInvoiced,
            invoice_date: None,
            invoice_due_date: None,
            paid_date: None,
        }
    }

    fn test_meter(job: &str, kind: MeterType, submitted: NaiveDate, status: MeterStatus) -> MeterApplication {
        MeterApplication {
            id: format!("m_{job}"),
            job_id: job.to_string(),
            meter_type: kind,
            date_submitted: submitted,
            submitted_by: "James Fordan".to_string(),
            approval_date: None,
            status,
            rejection_reason: None,
            documents: vec![],
        }
    }

    fn test_customer() -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Emily Davis".to_string(),
            address: "23 Beach Blvd".to_string(),
            phone: "0445 678 901".to_string(),
            email: "emily.d@email.com".to_string(),
        }
    }

    #[test]
    fn pre_meter_pending_past_threshold_fires() {
        let job = test_job("j1", PipelineStage::PreMeterSubmitted);
        let meter = test_meter("j1", MeterType::PreMeter, day(-10), MeterStatus::Pending);
        let alerts = derive(&[job], &[meter], &[test_customer()], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "alert_pm_j1");
        assert_eq!(alerts[0].alert_type, AlertType::PreMeterPending);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("10 days"));
        assert!(alerts[0].message.contains("Emily Davis"));
    }

    #[test]
    fn pre_meter_pending_at_exactly_seven_days_does_not_fire() {
        let job = test_job("j1", PipelineStage::PreMeterSubmitted);
        // Submitted 7 days ago at midnight; 7.5 days elapsed floors to 7,
        // and the rule is strictly greater-than.
        let meter = test_meter("j1", MeterType::PreMeter, day(-7), MeterStatus::Pending);
        let alerts = derive(&[job], &[meter], &[test_customer()], now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn install_soon_without_pre_meter_fires() {
        let mut job = test_job("j2", PipelineStage::Scheduled);
        job.install_date = Some(day(2));
        let alerts = derive(&[job], &[], &[test_customer()], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "alert_inst_j2");
        assert_eq!(alerts[0].alert_type, AlertType::InstallPreMeterRisk);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn install_soon_with_approved_pre_meter_is_quiet() {
        let mut job = test_job("j2", PipelineStage::Scheduled);
        job.install_date = Some(day(2));
        let meter = test_meter("j2", MeterType::PreMeter, day(-10), MeterStatus::Approved);
        let alerts = derive(&[job], &[meter], &[test_customer()], now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn install_in_the_past_is_out_of_the_window() {
        let mut job = test_job("j2", PipelineStage::Scheduled);
        job.install_date = Some(day(-1));
        let alerts = derive(&[job], &[], &[test_customer()], now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn post_meter_missing_after_install_fires_medium() {
        let mut job = test_job("j3", PipelineStage::Installed);
        job.install_date = Some(day(-5));
        let alerts = derive(&[job], &[], &[test_customer()], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "alert_postm_j3");
        assert_eq!(alerts[0].alert_type, AlertType::PostMeterLate);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert!(alerts[0].message.contains("5 days after install"));
    }

    #[test]
    fn post_meter_rule_needs_installed_stage() {
        let mut job = test_job("j3", PipelineStage::Completed);
        job.install_date = Some(day(-5));
        let alerts = derive(&[job], &[], &[test_customer()], now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn invoice_overdue_fires_with_formatted_price() {
        let mut job = test_job("j4", PipelineStage::Invoiced);
        job.invoice_status = InvoiceStatus::Invoiced;
        job.invoice_date = Some(day(-20));
        let alerts = derive(&[job], &[], &[test_customer()], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "alert_inv_j4");
        assert_eq!(alerts[0].alert_type, AlertType::InvoiceOverdue);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!(alerts[0].message.contains("20 days"));
        assert!(alerts[0].message.contains("$19,000"));
    }

    #[test]
    fn rules_are_independent_and_can_stack() {
        let mut job = test_job("j5", PipelineStage::Installed);
        job.install_date = Some(day(-5));
        job.invoice_status = InvoiceStatus::Invoiced;
        job.invoice_date = Some(day(-20));
        let meter = test_meter("j5", MeterType::PreMeter, day(-15), MeterStatus::Pending);
        let alerts = derive(&[job], &[meter], &[test_customer()], now());

        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alert_pm_j5", "alert_postm_j5", "alert_inv_j5"]);
    }

    #[test]
    fn missing_customer_falls_back_to_unknown() {
        let mut job = test_job("j6", PipelineStage::Installed);
        job.customer_id = "nope".to_string();
        job.install_date = Some(day(-5));
        let alerts = derive(&[job], &[], &[test_customer()], now());
        assert!(alerts[0].message.contains("Unknown"));
    }

    #[test]
    fn derivation_is_idempotent_for_stable_input() {
        let mut job = test_job("j7", PipelineStage::Installed);
        job.install_date = Some(day(-5));
        let customers = [test_customer()];
        let first = derive(std::slice::from_ref(&job), &[], &customers, now());
        let second = derive(std::slice::from_ref(&job), &[], &customers, now());
        let first_ids: Vec<&String> = first.iter().map(|a| &a.id).collect();
        let second_ids: Vec<&String> = second.iter().map(|a| &a.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn day_floor_semantics() {
        let base = now();
        assert_eq!(days_between(base - Duration::hours(23), base), 0);
        assert_eq!(days_between(base - Duration::hours(25), base), 1);
        assert_eq!(days_between(base, base + Duration::hours(36)), 1);
        // A partial day in the past floors to -1, not 0.
        assert_eq!(days_between(base, base - Duration::hours(1)), -1);
    }
}
