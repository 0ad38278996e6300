//! Fixed initial data set. Dates are relative to "today" so the pipeline,
//! calendar, and alert rules always have something current to chew on.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{
    Alert, AlertSeverity, AlertType, AppUser, Comment, Customer, FileCategory, FileUpload,
    InvoiceStatus, Job, MeterApplication, MeterStatus, MeterType, Note, PipelineStage, SystemType,
    TimelineEvent, UserRole,
};

fn d(days_from_now: i64) -> NaiveDate {
    Local::now().date_naive() + Duration::days(days_from_now)
}

fn dt(days_from_now: i64) -> NaiveDateTime {
    d(days_from_now).and_time(NaiveTime::MIN)
}

pub fn users() -> Vec<AppUser> {
    let user = |id: &str, name: &str, role: UserRole, team: Option<&str>| AppUser {
        id: id.to_string(),
        name: name.to_string(),
        role,
        team: team.map(str::to_string),
    };
    vec![
        user("u1", "James Fordan", UserRole::Admin, None),
        user("u2", "Mike Torres", UserRole::Installer, Some("Team 1")),
        user("u3", "Dave Chen", UserRole::Installer, Some("Team 2")),
        user("u4", "Sam Reeves", UserRole::Installer, Some("Team 3")),
    ]
}

pub fn customers() -> Vec<Customer> {
    let customer = |id: &str, name: &str, address: &str, phone: &str, email: &str| Customer {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
    };
    vec![
        customer("c1", "John Smith", "12 Oak Street, Brisbane QLD 4000", "0412 345 678", "john.smith@email.com"),
        customer("c2", "Sarah Johnson", "45 River Road, Gold Coast QLD 4217", "0423 456 789", "sarah.j@email.com"),
        customer("c3", "Michael Brown", "78 Hill Ave, Sunshine Coast QLD 4556", "0434 567 890", "mbrown@email.com"),
        customer("c4", "Emily Davis", "23 Beach Blvd, Cairns QLD 4870", "0445 678 901", "emily.d@email.com"),
        customer("c5", "David Wilson", "56 Park Lane, Townsville QLD 4810", "0456 789 012", "dwilson@email.com"),
        customer("c6", "Lisa Anderson", "89 Main St, Toowoomba QLD 4350", "0467 890 123", "lisa.a@email.com"),
        customer("c7", "Robert Taylor", "34 Garden Cres, Ipswich QLD 4305", "0478 901 234", "rtaylor@email.com"),
        customer("c8", "Jennifer Martin", "67 Sunset Dr, Mackay QLD 4740", "0489 012 345", "jmartin@email.com"),
        customer("c9", "Chris Thompson", "12 Lake View, Rockhampton QLD 4700", "0490 123 456", "cthompson@email.com"),
        customer("c10", "Amanda White", "45 Forest Rd, Bundaberg QLD 4670", "0401 234 567", "awhite@email.com"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn job(
    id: &str,
    customer: &str,
    system: SystemType,
    kw: f64,
    contract: bool,
    deposit: Option<(i64, i64)>,
    price: i64,
    eta: i64,
    stage: PipelineStage,
    install: Option<i64>,
    team: &str,
) -> Job {
    Job {
        id: id.to_string(),
        customer_id: customer.to_string(),
        system_type: system,
        system_size_kw: kw,
        contract_signed: contract,
        deposit_paid: deposit.is_some(),
        deposit_amount: deposit.map_or(0, |(amount, _)| amount),
        deposit_date: deposit.map(|(_, days)| d(days)),
        project_price: price,
        eta_completion_date: d(eta),
        pipeline_stage: stage,
        install_date: install.map(d),
        assigned_team: team.to_string(),
        job_status: stage.label().to_string(),
        invoice_status: InvoiceStatus::NotInvoiced,
        invoice_date: None,
        invoice_due_date: None,
        paid_date: None,
    }
}

fn invoiced(mut job: Job, invoice: i64, due: i64) -> Job {
    job.invoice_status = InvoiceStatus::Invoiced;
    job.invoice_date = Some(d(invoice));
    job.invoice_due_date = Some(d(due));
    job
}

fn paid(job: Job, invoice: i64, due: i64, paid_on: i64) -> Job {
    let mut job = invoiced(job, invoice, due);
    job.invoice_status = InvoiceStatus::Paid;
    job.paid_date = Some(d(paid_on));
    job
}

pub fn jobs() -> Vec<Job> {
    use PipelineStage::*;
    use SystemType::*;
    vec![
        job("j1", "c1", Both, 10.0, true, Some((3000, -30)), 18500, 5, Scheduled, Some(2), "Team 1"),
        job("j2", "c2", Solar, 6.6, true, Some((2000, -45)), 12000, -5, Installed, Some(-3), "Team 2"),
        invoiced(job("j3", "c3", Solar, 13.2, true, Some((4000, -60)), 24000, -15, Invoiced, Some(-20), "Team 1"), -10, 4),
        job("j4", "c4", Battery, 5.0, true, Some((2500, -20)), 15000, 10, PreMeterSubmitted, None, "Team 3"),
        job("j5", "c5", Solar, 8.8, true, None, 16500, 30, Won, None, "Team 1"),
        paid(job("j6", "c6", Both, 15.0, true, Some((5000, -90)), 32000, -30, Paid, Some(-40), "Team 2"), -25, -11, -8),
        job("j7", "c7", Solar, 6.6, false, None, 11000, 45, Quoted, None, "Team 2"),
        job("j8", "c8", Solar, 10.0, true, Some((3000, -15)), 19500, 7, PreMeterApproved, None, "Team 3"),
        job("j9", "c9", Both, 20.0, true, Some((6000, -50)), 42000, -10, Completed, Some(-15), "Team 1"),
        job("j10", "c10", Solar, 5.0, false, None, 9500, 60, Lead, None, "Team 1"),
        job("j11", "c1", Battery, 10.0, true, Some((3500, -10)), 21000, 14, Scheduled, Some(3), "Team 2"),
        job("j12", "c3", Solar, 6.6, true, Some((2000, -25)), 13000, 3, Scheduled, Some(2), "Team 3"),
        job("j13", "c5", Solar, 9.9, false, None, 17000, 50, Lead, None, "Team 2"),
        job("j14", "c7", Both, 12.0, true, Some((4000, -40)), 28000, -8, PostMeterSubmitted, Some(-12), "Team 1"),
        paid(job("j15", "c8", Solar, 6.6, true, Some((2000, -70)), 12500, -25, Paid, Some(-35), "Team 3"), -20, -6, -3),
        job("j16", "c2", Battery, 13.5, true, Some((4500, -8)), 25000, 20, PreMeterSubmitted, None, "Team 2"),
        invoiced(job("j17", "c4", Solar, 10.0, true, Some((3000, -55)), 19000, -18, Invoiced, Some(-25), "Team 2"), -15, -1),
        job("j18", "c6", Solar, 8.0, false, None, 14500, 40, Quoted, None, "Team 3"),
        job("j19", "c9", Both, 16.0, true, Some((5000, -35)), 35000, 1, Scheduled, Some(1), "Team 1"),
        job("j20", "c10", Solar, 6.6, true, Some((2000, -5)), 12000, 25, Won, None, "Team 3"),
        paid(job("j21", "c1", Solar, 5.0, true, Some((1500, -80)), 9000, -40, Paid, Some(-50), "Team 2"), -35, -21, -18),
        job("j22", "c3", Both, 11.0, true, Some((3500, -12)), 22000, 12, PreMeterApproved, None, "Team 1"),
    ]
}

fn meter(id: &str, job: &str, kind: MeterType, submitted: i64, approved: Option<i64>) -> MeterApplication {
    MeterApplication {
        id: id.to_string(),
        job_id: job.to_string(),
        meter_type: kind,
        date_submitted: d(submitted),
        submitted_by: "James Fordan".to_string(),
        approval_date: approved.map(d),
        status: if approved.is_some() { MeterStatus::Approved } else { MeterStatus::Pending },
        rejection_reason: None,
        documents: vec![format!("{}_form_{}.pdf", kind.as_str(), job)],
    }
}

pub fn meters() -> Vec<MeterApplication> {
    use MeterType::*;
    vec![
        meter("m1", "j1", PreMeter, -20, Some(-12)),
        meter("m2", "j2", PreMeter, -30, Some(-22)),
        meter("m3", "j3", PreMeter, -50, Some(-42)),
        meter("m4", "j3", PostMeter, -18, Some(-12)),
        meter("m5", "j4", PreMeter, -10, None),
        meter("m6", "j8", PreMeter, -12, Some(-5)),
        meter("m7", "j9", PreMeter, -40, Some(-32)),
        meter("m8", "j9", PostMeter, -12, Some(-8)),
        meter("m9", "j14", PreMeter, -35, Some(-28)),
        meter("m10", "j14", PostMeter, -5, None),
        meter("m11", "j16", PreMeter, -5, None),
        meter("m12", "j22", PreMeter, -8, Some(-3)),
        meter("m13", "j11", PreMeter, -7, Some(-2)),
        meter("m14", "j12", PreMeter, -18, Some(-10)),
        meter("m15", "j19", PreMeter, -25, Some(-18)),
        meter("m16", "j6", PreMeter, -80, Some(-72)),
        meter("m17", "j6", PostMeter, -35, Some(-28)),
        meter("m18", "j15", PreMeter, -60, Some(-52)),
        meter("m19", "j15", PostMeter, -30, Some(-22)),
        meter("m20", "j21", PreMeter, -70, Some(-62)),
        meter("m21", "j21", PostMeter, -45, Some(-38)),
        meter("m22", "j17", PreMeter, -45, Some(-38)),
        meter("m23", "j17", PostMeter, -20, Some(-14)),
    ]
}

pub fn notes() -> Vec<Note> {
    let note = |id: &str, job: &str, text: &str, created: i64, by: &str| Note {
        id: id.to_string(),
        job_id: job.to_string(),
        text: text.to_string(),
        created_at: dt(created),
        created_by: by.to_string(),
    };
    vec![
        note("n1", "j1", "Customer wants panels on north-facing roof only", -28, "James Fordan"),
        note("n2", "j2", "Access via side gate, call before arrival", -40, "James Fordan"),
        note("n3", "j4", "Battery install in garage, customer has cleared space", -18, "Mike Torres"),
        note("n4", "j9", "Large system — may need crane for panels", -48, "Dave Chen"),
    ]
}

pub fn comments() -> Vec<Comment> {
    let comment = |id: &str, job: &str, text: &str, created: i64, by: &str| Comment {
        id: id.to_string(),
        job_id: job.to_string(),
        text: text.to_string(),
        created_at: dt(created),
        created_by: by.to_string(),
    };
    vec![
        comment("cm1", "j1", "Confirmed install date with customer", -5, "James Fordan"),
        comment("cm2", "j3", "Invoice sent, following up next week", -8, "James Fordan"),
        comment("cm3", "j17", "Payment overdue — sending reminder", -1, "James Fordan"),
    ]
}

pub fn files() -> Vec<FileUpload> {
    let file = |id: &str, job: &str, category: FileCategory, name: &str, at: i64, by: &str| FileUpload {
        id: id.to_string(),
        job_id: job.to_string(),
        category,
        filename: name.to_string(),
        uploaded_at: dt(at),
        uploaded_by: by.to_string(),
        url: "#".to_string(),
    };
    vec![
        file("f1", "j1", FileCategory::SignedPaperwork, "contract_j1.pdf", -29, "James Fordan"),
        file("f2", "j2", FileCategory::Photos, "install_photo_1.jpg", -2, "Mike Torres"),
        file("f3", "j3", FileCategory::MeterDocs, "post_meter_cert.pdf", -17, "James Fordan"),
        file("f4", "j6", FileCategory::Photos, "completed_install.jpg", -38, "Dave Chen"),
    ]
}

pub fn timeline() -> Vec<TimelineEvent> {
    let event = |id: &str, job: &str, kind: &str, desc: &str, at: i64, by: &str| TimelineEvent {
        id: id.to_string(),
        job_id: job.to_string(),
        event_type: kind.to_string(),
        description: desc.to_string(),
        created_at: dt(at),
        created_by: by.to_string(),
    };
    vec![
        event("te1", "j1", "stage_change", "Moved to Scheduled", -10, "James Fordan"),
        event("te2", "j2", "stage_change", "Moved to Installed", -3, "Mike Torres"),
        event("te3", "j3", "stage_change", "Moved to Invoiced", -10, "James Fordan"),
        event("te4", "j1", "pre_meter_submitted", "Pre-meter application submitted", -20, "James Fordan"),
        event("te5", "j1", "pre_meter_approved", "Pre-meter application approved", -12, "James Fordan"),
        event("te6", "j6", "stage_change", "Moved to Paid", -8, "James Fordan"),
    ]
}

pub fn alerts() -> Vec<Alert> {
    let alert = |id: &str, job: &str, kind: AlertType, severity: AlertSeverity, msg: String, at: i64, resolved: bool| Alert {
        id: id.to_string(),
        job_id: job.to_string(),
        alert_type: kind,
        severity,
        message: msg,
        created_at: dt(at),
        resolved,
    };
    vec![
        alert("a1", "j4", AlertType::PreMeterPending, AlertSeverity::High,
            "Pre-meter pending for 10+ days — Emily Davis (Battery 5kW)".to_string(), 0, false),
        alert("a2", "j2", AlertType::PostMeterLate, AlertSeverity::Medium,
            "Post-meter not submitted — Sarah Johnson installed 3 days ago".to_string(), 0, false),
        alert("a3", "j17", AlertType::InvoiceOverdue, AlertSeverity::High,
            format!("Invoice overdue — Emily Davis $19,000 due {}", d(-1)), 0, false),
        alert("a4", "j19", AlertType::InstallPreMeterRisk, AlertSeverity::Low,
            "Install tomorrow — Chris Thompson pre-meter approved".to_string(), 0, true),
        alert("a5", "j9", AlertType::PostMeterLate, AlertSeverity::Low,
            "Post-meter submitted and approved for Chris Thompson".to_string(), -8, true),
    ]
}
