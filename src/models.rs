use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Lead,
    Quoted,
    Won,
    PreMeterSubmitted,
    PreMeterApproved,
    Scheduled,
    Installed,
    PostMeterSubmitted,
    Completed,
    Invoiced,
    Paid,
}

impl PipelineStage {
    /// All stages, in pipeline order.
    pub const ALL: [PipelineStage; 11] = [
        PipelineStage::Lead,
        PipelineStage::Quoted,
        PipelineStage::Won,
        PipelineStage::PreMeterSubmitted,
        PipelineStage::PreMeterApproved,
        PipelineStage::Scheduled,
        PipelineStage::Installed,
        PipelineStage::PostMeterSubmitted,
        PipelineStage::Completed,
        PipelineStage::Invoiced,
        PipelineStage::Paid,
    ];

    /// Raw stage key, as stored in `Job::job_status` after a move.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Lead => "lead",
            PipelineStage::Quoted => "quoted",
            PipelineStage::Won => "won",
            PipelineStage::PreMeterSubmitted => "pre_meter_submitted",
            PipelineStage::PreMeterApproved => "pre_meter_approved",
            PipelineStage::Scheduled => "scheduled",
            PipelineStage::Installed => "installed",
            PipelineStage::PostMeterSubmitted => "post_meter_submitted",
            PipelineStage::Completed => "completed",
            PipelineStage::Invoiced => "invoiced",
            PipelineStage::Paid => "paid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Lead => "Lead",
            PipelineStage::Quoted => "Quoted",
            PipelineStage::Won => "Won",
            PipelineStage::PreMeterSubmitted => "Pre-Meter Submitted",
            PipelineStage::PreMeterApproved => "Pre-Meter Approved",
            PipelineStage::Scheduled => "Scheduled",
            PipelineStage::Installed => "Installed",
            PipelineStage::PostMeterSubmitted => "Post-Meter Submitted",
            PipelineStage::Completed => "Completed",
            PipelineStage::Invoiced => "Invoiced",
            PipelineStage::Paid => "Paid",
        }
    }

    /// Position in pipeline order, used for dashboard bucketing.
    pub fn index(self) -> usize {
        match self {
            PipelineStage::Lead => 0,
            PipelineStage::Quoted => 1,
            PipelineStage::Won => 2,
            PipelineStage::PreMeterSubmitted => 3,
            PipelineStage::PreMeterApproved => 4,
            PipelineStage::Scheduled => 5,
            PipelineStage::Installed => 6,
            PipelineStage::PostMeterSubmitted => 7,
            PipelineStage::Completed => 8,
            PipelineStage::Invoiced => 9,
            PipelineStage::Paid => 10,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    Solar,
    Battery,
    Both,
}

impl SystemType {
    pub fn as_str(self) -> &'static str {
        match self {
            SystemType::Solar => "solar",
            SystemType::Battery => "battery",
            SystemType::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    NotInvoiced,
    Invoiced,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::NotInvoiced => "not_invoiced",
            InvoiceStatus::Invoiced => "invoiced",
            InvoiceStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterType {
    PreMeter,
    PostMeter,
}

impl MeterType {
    pub fn as_str(self) -> &'static str {
        match self {
            MeterType::PreMeter => "pre_meter",
            MeterType::PostMeter => "post_meter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterStatus {
    Pending,
    Approved,
    Rejected,
}

impl MeterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeterStatus::Pending => "pending",
            MeterStatus::Approved => "approved",
            MeterStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "PRE_METER_PENDING_7_DAYS")]
    PreMeterPending,
    #[serde(rename = "INSTALL_WITHIN_3_DAYS_PRE_METER_NOT_APPROVED")]
    InstallPreMeterRisk,
    #[serde(rename = "POST_METER_NOT_SUBMITTED_2_DAYS_AFTER_INSTALL")]
    PostMeterLate,
    #[serde(rename = "INVOICE_NOT_PAID_AFTER_X_DAYS")]
    InvoiceOverdue,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::PreMeterPending => "PRE_METER_PENDING_7_DAYS",
            AlertType::InstallPreMeterRisk => "INSTALL_WITHIN_3_DAYS_PRE_METER_NOT_APPROVED",
            AlertType::PostMeterLate => "POST_METER_NOT_SUBMITTED_2_DAYS_AFTER_INSTALL",
            AlertType::InvoiceOverdue => "INVOICE_NOT_PAID_AFTER_X_DAYS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Photos,
    SignedPaperwork,
    MeterDocs,
    Other,
}

impl FileCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Photos => "photos",
            FileCategory::SignedPaperwork => "signed_paperwork",
            FileCategory::MeterDocs => "meter_docs",
            FileCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photos" => Some(FileCategory::Photos),
            "signed_paperwork" => Some(FileCategory::SignedPaperwork),
            "meter_docs" => Some(FileCategory::MeterDocs),
            "other" => Some(FileCategory::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Installer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub customer_id: String,
    pub system_type: SystemType,
    pub system_size_kw: f64,
    pub contract_signed: bool,
    pub deposit_paid: bool,
    pub deposit_amount: i64,
    pub deposit_date: Option<NaiveDate>,
    pub project_price: i64,
    pub eta_completion_date: NaiveDate,
    pub pipeline_stage: PipelineStage,
    pub install_date: Option<NaiveDate>,
    pub assigned_team: String,
    /// Free-text mirror of the stage. Seed rows carry display labels;
    /// `Store::move_job_stage` writes the raw stage key.
    pub job_status: String,
    pub invoice_status: InvoiceStatus,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterApplication {
    pub id: String,
    pub job_id: String,
    pub meter_type: MeterType,
    pub date_submitted: NaiveDate,
    pub submitted_by: String,
    pub approval_date: Option<NaiveDate>,
    pub status: MeterStatus,
    pub rejection_reason: Option<String>,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub job_id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub job_id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    pub id: String,
    pub job_id: String,
    pub category: FileCategory,
    pub filename: String,
    pub uploaded_at: NaiveDateTime,
    pub uploaded_by: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub job_id: String,
    pub event_type: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub job_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub team: Option<String>,
}

/// Outcome of an admin decision on a meter application.
#[derive(Debug, Clone)]
pub enum MeterDecision {
    Approve,
    Reject { reason: String },
}

/// "$19,000" style formatting for whole-dollar amounts.
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_keys_round_trip() {
        for stage in PipelineStage::ALL {
            assert_eq!(PipelineStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(PipelineStage::parse("installing"), None);
    }

    #[test]
    fn stage_order_matches_index() {
        for (i, stage) in PipelineStage::ALL.into_iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert!(PipelineStage::Lead.index() < PipelineStage::Scheduled.index());
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(0), "$0");
        assert_eq!(format_money(950), "$950");
        assert_eq!(format_money(19000), "$19,000");
        assert_eq!(format_money(1234567), "$1,234,567");
        assert_eq!(format_money(-4200), "-$4,200");
    }
}
