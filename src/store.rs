//! The in-memory domain store. Owns every entity collection, the global
//! pre-meter override, and the team-name set. All mutation goes through
//! the methods here; precondition failures return `false` or no-op rather
//! than erroring (the views surface the message).

use chrono::{Duration, Local, NaiveDateTime};

use crate::alerts;
use crate::models::{
    Alert, AppUser, Comment, Customer, FileUpload, Job, MeterApplication, MeterDecision,
    MeterStatus, MeterType, Note, PipelineStage, TimelineEvent, UserRole,
};
use crate::seed;

pub struct Store {
    pub jobs: Vec<Job>,
    pub customers: Vec<Customer>,
    pub meters: Vec<MeterApplication>,
    pub notes: Vec<Note>,
    pub comments: Vec<Comment>,
    pub files: Vec<FileUpload>,
    pub timeline: Vec<TimelineEvent>,
    pub alerts: Vec<Alert>,
    pub users: Vec<AppUser>,
    /// Known team names, first-seen order. Seeded once at construction from
    /// job assignments and user memberships; grown only via the add paths.
    pub teams: Vec<String>,
    override_pre_meter: bool,
    /// When set, a refresh re-marks regenerated alerts as resolved if the
    /// previous collection had resolved the same id. Off by default: the
    /// stock behavior is a wholesale replace.
    pub keep_resolved_alerts: bool,
    id_seq: u64,
}

impl Store {
    pub fn new() -> Self {
        let jobs = seed::jobs();
        let users = seed::users();

        let mut teams: Vec<String> = Vec::new();
        for name in jobs
            .iter()
            .map(|j| j.assigned_team.as_str())
            .chain(users.iter().filter_map(|u| u.team.as_deref()))
        {
            if !teams.iter().any(|t| t == name) {
                teams.push(name.to_string());
            }
        }

        Store {
            jobs,
            customers: seed::customers(),
            meters: seed::meters(),
            notes: seed::notes(),
            comments: seed::comments(),
            files: seed::files(),
            timeline: seed::timeline(),
            alerts: seed::alerts(),
            users,
            teams,
            override_pre_meter: false,
            keep_resolved_alerts: false,
            id_seq: 100,
        }
    }

    pub(crate) fn next_id(&mut self, prefix: &str) -> String {
        self.id_seq += 1;
        format!("{}_{}", prefix, self.id_seq)
    }

    fn push_event(&mut self, job_id: &str, event_type: &str, description: String, user: &str) {
        let id = self.next_id("te");
        self.timeline.push(TimelineEvent {
            id,
            job_id: job_id.to_string(),
            event_type: event_type.to_string(),
            description,
            created_at: Local::now().naive_local(),
            created_by: user.to_string(),
        });
    }

    // --- Mutations ---

    pub fn add_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }

    pub fn override_pre_meter(&self) -> bool {
        self.override_pre_meter
    }

    pub fn set_override_pre_meter(&mut self, value: bool) {
        self.override_pre_meter = value;
    }

    /// Move a job to a new pipeline stage. Any stage is reachable from any
    /// other, except the move into Installed: that requires an approved
    /// pre-meter application unless the global override is on. A blocked or
    /// unknown-job move returns false and mutates nothing.
    pub fn move_job_stage(&mut self, job_id: &str, new_stage: PipelineStage, user: &str) -> bool {
        let Some(idx) = self.jobs.iter().position(|j| j.id == job_id) else {
            return false;
        };

        if new_stage == PipelineStage::Installed && !self.override_pre_meter {
            let approved = self
                .pre_meter(job_id)
                .is_some_and(|m| m.status == MeterStatus::Approved);
            if !approved {
                return false;
            }
        }

        let job = &mut self.jobs[idx];
        job.pipeline_stage = new_stage;
        job.job_status = new_stage.as_str().to_string();

        self.push_event(
            job_id,
            "stage_change",
            format!("Moved to {}", new_stage.as_str().replace('_', " ")),
            user,
        );
        true
    }

    /// Reassign a job to another team. Registers the team name if new and
    /// records the reassignment on the timeline. Unchanged assignments are
    /// accepted silently without an event.
    pub fn assign_team(&mut self, job_id: &str, team: &str, user: &str) -> bool {
        let Some(idx) = self.jobs.iter().position(|j| j.id == job_id) else {
            return false;
        };
        if self.jobs[idx].assigned_team == team {
            return true;
        }
        self.add_team(team);
        self.jobs[idx].assigned_team = team.to_string();
        self.push_event(job_id, "assignment_change", format!("Assigned to {team}"), user);
        true
    }

    /// Send the invoice: only from not_invoiced. Due date is 14 days out.
    pub fn mark_invoiced(&mut self, job_id: &str) -> bool {
        let today = Local::now().date_naive();
        let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) else {
            return false;
        };
        if job.invoice_status != crate::models::InvoiceStatus::NotInvoiced {
            return false;
        }
        job.invoice_status = crate::models::InvoiceStatus::Invoiced;
        job.invoice_date = Some(today);
        job.invoice_due_date = Some(today + Duration::days(alerts::INVOICE_OVERDUE_DAYS));
        true
    }

    /// Record payment: only from invoiced.
    pub fn mark_paid(&mut self, job_id: &str) -> bool {
        let today = Local::now().date_naive();
        let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) else {
            return false;
        };
        if job.invoice_status != crate::models::InvoiceStatus::Invoiced {
            return false;
        }
        job.invoice_status = crate::models::InvoiceStatus::Paid;
        job.paid_date = Some(today);
        true
    }

    /// Approve or reject a meter application and record the decision on the
    /// job's timeline.
    pub fn decide_meter(&mut self, meter_id: &str, decision: MeterDecision, user: &str) -> bool {
        let today = Local::now().date_naive();
        let Some(idx) = self.meters.iter().position(|m| m.id == meter_id) else {
            return false;
        };

        let (event_type, outcome) = match decision {
            MeterDecision::Approve => {
                let meter = &mut self.meters[idx];
                meter.status = MeterStatus::Approved;
                meter.approval_date = Some(today);
                meter.rejection_reason = None;
                ("meter_approved", "approved")
            }
            MeterDecision::Reject { reason } => {
                let meter = &mut self.meters[idx];
                meter.status = MeterStatus::Rejected;
                meter.approval_date = None;
                meter.rejection_reason = Some(reason);
                ("meter_rejected", "rejected")
            }
        };

        let job_id = self.meters[idx].job_id.clone();
        self.push_event(&job_id, event_type, format!("Meter application {outcome}"), user);
        true
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    pub fn add_file(&mut self, file: FileUpload) {
        self.files.push(file);
    }

    pub fn add_timeline_event(&mut self, event: TimelineEvent) {
        self.timeline.push(event);
    }

    pub fn resolve_alert(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Recompute the alert collection from current state. This is a
    /// wholesale replace: alerts resolved by hand do not survive unless
    /// `keep_resolved_alerts` is enabled.
    pub fn refresh_alerts(&mut self) {
        self.refresh_alerts_at(Local::now().naive_local());
    }

    pub fn refresh_alerts_at(&mut self, now: NaiveDateTime) {
        let mut next = alerts::derive(&self.jobs, &self.meters, &self.customers, now);
        if self.keep_resolved_alerts {
            for alert in &mut next {
                if self.alerts.iter().any(|a| a.id == alert.id && a.resolved) {
                    alert.resolved = true;
                }
            }
        }
        self.alerts = next;
    }

    // --- Teams and users ---

    pub fn add_team(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if !self.teams.iter().any(|t| t == name) {
            self.teams.push(name.to_string());
        }
    }

    /// Create a new installer, optionally pre-assigned to a team. Returns the
    /// generated user id, or None for a blank name.
    pub fn add_team_member(&mut self, name: &str, team: Option<&str>) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let team = team.map(str::trim).filter(|t| !t.is_empty());
        if let Some(team) = team {
            self.add_team(team);
        }
        let id = self.next_id("u");
        self.users.push(AppUser {
            id: id.clone(),
            name: name.to_string(),
            role: UserRole::Installer,
            team: team.map(str::to_string),
        });
        Some(id)
    }

    /// Set or clear a user's team membership.
    pub fn update_user_team(&mut self, user_id: &str, team: Option<&str>) -> bool {
        let team = team.map(str::trim).filter(|t| !t.is_empty());
        if let Some(team) = team {
            self.add_team(team);
        }
        match self.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.team = team.map(str::to_string);
                true
            }
            None => false,
        }
    }

    // --- Read-model queries ---

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&AppUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn installers(&self) -> Vec<&AppUser> {
        self.users.iter().filter(|u| u.role == UserRole::Installer).collect()
    }

    pub fn job_meters(&self, job_id: &str) -> Vec<&MeterApplication> {
        self.meters.iter().filter(|m| m.job_id == job_id).collect()
    }

    pub fn job_notes(&self, job_id: &str) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.job_id == job_id).collect()
    }

    pub fn job_comments(&self, job_id: &str) -> Vec<&Comment> {
        self.comments.iter().filter(|c| c.job_id == job_id).collect()
    }

    pub fn job_files(&self, job_id: &str) -> Vec<&FileUpload> {
        self.files.iter().filter(|f| f.job_id == job_id).collect()
    }

    /// Timeline for a job, most recent first.
    pub fn job_timeline(&self, job_id: &str) -> Vec<&TimelineEvent> {
        let mut events: Vec<&TimelineEvent> =
            self.timeline.iter().filter(|t| t.job_id == job_id).collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }

    /// Unresolved alerts for a job.
    pub fn job_alerts(&self, job_id: &str) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| a.job_id == job_id && !a.resolved)
            .collect()
    }

    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| !a.resolved).collect()
    }

    /// First pre-meter application for a job, insertion order.
    pub fn pre_meter(&self, job_id: &str) -> Option<&MeterApplication> {
        self.meters
            .iter()
            .find(|m| m.job_id == job_id && m.meter_type == MeterType::PreMeter)
    }

    /// First post-meter application for a job, insertion order.
    pub fn post_meter(&self, job_id: &str) -> Option<&MeterApplication> {
        self.meters
            .iter()
            .find(|m| m.job_id == job_id && m.meter_type == MeterType::PostMeter)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;

    // Seed fixture notes: j4 has a pending pre-meter, j1 an approved one,
    // j10 has none at all.

    #[test]
    fn install_move_blocked_without_pre_meter_approval() {
        let mut store = Store::new();
        let before_stage = store.job("j4").map(|j| j.pipeline_stage);
        let before_timeline = store.timeline.len();

        assert!(!store.move_job_stage("j4", PipelineStage::Installed, "James Fordan"));

        assert_eq!(store.job("j4").map(|j| j.pipeline_stage), before_stage);
        assert_eq!(store.timeline.len(), before_timeline);
    }

    #[test]
    fn install_move_blocked_with_no_pre_meter_at_all() {
        let mut store = Store::new();
        assert!(!store.move_job_stage("j10", PipelineStage::Installed, "James Fordan"));
        assert_eq!(
            store.job("j10").map(|j| j.pipeline_stage),
            Some(PipelineStage::Lead)
        );
    }

    #[test]
    fn override_bypasses_pre_meter_lock() {
        let mut store = Store::new();
        store.set_override_pre_meter(true);

        assert!(store.move_job_stage("j4", PipelineStage::Installed, "James Fordan"));
        assert_eq!(
            store.job("j4").map(|j| j.pipeline_stage),
            Some(PipelineStage::Installed)
        );
    }

    #[test]
    fn approved_pre_meter_allows_install_move() {
        let mut store = Store::new();
        assert!(store.move_job_stage("j1", PipelineStage::Installed, "Mike Torres"));
    }

    #[test]
    fn job_status_mirrors_stage_after_move() {
        let mut store = Store::new();
        assert!(store.move_job_stage("j10", PipelineStage::Quoted, "James Fordan"));
        let job = store.job("j10").expect("j10 exists");
        assert_eq!(job.pipeline_stage, PipelineStage::Quoted);
        // Raw key, not the display label.
        assert_eq!(job.job_status, "quoted");
    }

    #[test]
    fn successful_move_appends_one_timeline_event() {
        let mut store = Store::new();
        let before = store.timeline.len();
        assert!(store.move_job_stage("j5", PipelineStage::PreMeterSubmitted, "Dave Chen"));

        assert_eq!(store.timeline.len(), before + 1);
        let event = store.timeline.last().expect("event appended");
        assert_eq!(event.job_id, "j5");
        assert_eq!(event.event_type, "stage_change");
        assert_eq!(event.description, "Moved to pre meter submitted");
        assert_eq!(event.created_by, "Dave Chen");
    }

    #[test]
    fn move_on_unknown_job_is_a_noop() {
        let mut store = Store::new();
        let before = store.timeline.len();
        assert!(!store.move_job_stage("j99", PipelineStage::Won, "James Fordan"));
        assert_eq!(store.timeline.len(), before);
    }

    #[test]
    fn teams_are_seeded_from_jobs_and_users() {
        let store = Store::new();
        assert_eq!(store.teams, vec!["Team 1", "Team 2", "Team 3"]);
    }

    #[test]
    fn add_team_trims_and_dedupes() {
        let mut store = Store::new();
        store.add_team("  Team 4  ");
        store.add_team("Team 4");
        store.add_team("   ");
        assert_eq!(store.teams, vec!["Team 1", "Team 2", "Team 3", "Team 4"]);
    }

    #[test]
    fn new_member_then_reassignment_registers_teams() {
        let mut store = Store::new();
        let id = store.add_team_member("Alex", Some("Team 2")).expect("member created");
        assert_eq!(store.user(&id).and_then(|u| u.team.as_deref()), Some("Team 2"));

        assert!(store.update_user_team(&id, Some("Team 4")));
        assert!(store.teams.iter().any(|t| t == "Team 4"));
        assert_eq!(store.user(&id).and_then(|u| u.team.as_deref()), Some("Team 4"));
    }

    #[test]
    fn blank_member_name_is_rejected() {
        let mut store = Store::new();
        let before = store.users.len();
        assert!(store.add_team_member("   ", Some("Team 1")).is_none());
        assert_eq!(store.users.len(), before);
    }

    #[test]
    fn clearing_a_users_team() {
        let mut store = Store::new();
        assert!(store.update_user_team("u2", None));
        assert_eq!(store.user("u2").and_then(|u| u.team.as_deref()), None);
    }

    #[test]
    fn team_reassignment_records_timeline_event() {
        let mut store = Store::new();
        assert!(store.assign_team("j1", "Team 3", "James Fordan"));
        let job = store.job("j1").expect("j1 exists");
        assert_eq!(job.assigned_team, "Team 3");
        let event = store.timeline.last().expect("event appended");
        assert_eq!(event.event_type, "assignment_change");
        assert_eq!(event.description, "Assigned to Team 3");
    }

    #[test]
    fn unchanged_team_assignment_adds_no_event() {
        let mut store = Store::new();
        let before = store.timeline.len();
        assert!(store.assign_team("j1", "Team 1", "James Fordan"));
        assert_eq!(store.timeline.len(), before);
    }

    #[test]
    fn meter_approval_sets_date_and_logs() {
        let mut store = Store::new();
        assert!(store.decide_meter("m5", MeterDecision::Approve, "James Fordan"));
        let meter = store.meters.iter().find(|m| m.id == "m5").expect("m5 exists");
        assert_eq!(meter.status, MeterStatus::Approved);
        assert!(meter.approval_date.is_some());
        let event = store.timeline.last().expect("event appended");
        assert_eq!(event.job_id, "j4");
        assert_eq!(event.event_type, "meter_approved");
    }

    #[test]
    fn meter_rejection_stores_reason() {
        let mut store = Store::new();
        let decision = MeterDecision::Reject { reason: "Rejected by admin".to_string() };
        assert!(store.decide_meter("m11", decision, "James Fordan"));
        let meter = store.meters.iter().find(|m| m.id == "m11").expect("m11 exists");
        assert_eq!(meter.status, MeterStatus::Rejected);
        assert_eq!(meter.rejection_reason.as_deref(), Some("Rejected by admin"));
        assert_eq!(meter.approval_date, None);
    }

    #[test]
    fn invoice_lifecycle_is_ordered() {
        let mut store = Store::new();
        // j9 is completed and not invoiced.
        assert!(!store.mark_paid("j9"));
        assert!(store.mark_invoiced("j9"));
        assert!(!store.mark_invoiced("j9"));
        let job = store.job("j9").expect("j9 exists");
        assert_eq!(job.invoice_status, InvoiceStatus::Invoiced);
        assert!(job.invoice_date.is_some());
        assert!(job.invoice_due_date.is_some());

        assert!(store.mark_paid("j9"));
        assert_eq!(store.job("j9").map(|j| j.invoice_status), Some(InvoiceStatus::Paid));
    }

    #[test]
    fn refresh_replaces_the_alert_collection() {
        let mut store = Store::new();
        store.refresh_alerts();
        // Seed state: j4's pre-meter has been pending 10 days, j2 was
        // installed 3 days ago with no post-meter, j17 was invoiced 15
        // days ago. Everything else is quiet.
        let mut ids: Vec<&str> = store.alerts.iter().map(|a| a.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["alert_inv_j17", "alert_pm_j4", "alert_postm_j2"]);
        assert!(store.alerts.iter().all(|a| !a.resolved));
    }

    #[test]
    fn manual_resolution_does_not_survive_refresh() {
        let mut store = Store::new();
        store.refresh_alerts();
        assert!(store.resolve_alert("alert_pm_j4"));
        assert!(store.alerts.iter().any(|a| a.id == "alert_pm_j4" && a.resolved));

        store.refresh_alerts();
        let alert = store
            .alerts
            .iter()
            .find(|a| a.id == "alert_pm_j4")
            .expect("condition still true");
        assert!(!alert.resolved);
    }

    #[test]
    fn keep_resolved_alerts_carries_resolution_across_refresh() {
        let mut store = Store::new();
        store.keep_resolved_alerts = true;
        store.refresh_alerts();
        assert!(store.resolve_alert("alert_pm_j4"));

        store.refresh_alerts();
        let alert = store
            .alerts
            .iter()
            .find(|a| a.id == "alert_pm_j4")
            .expect("condition still true");
        assert!(alert.resolved);
        assert!(store.job_alerts("j4").is_empty());
    }

    #[test]
    fn resolve_unknown_alert_returns_false() {
        let mut store = Store::new();
        assert!(!store.resolve_alert("alert_nothing"));
    }

    #[test]
    fn timeline_query_is_most_recent_first() {
        let store = Store::new();
        let events = store.job_timeline("j1");
        assert_eq!(events.len(), 3);
        for pair in events.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn job_alerts_filters_resolved() {
        let store = Store::new();
        // Seed alert a4 for j19 is resolved; nothing unresolved remains.
        assert!(store.job_alerts("j19").is_empty());
        // Seed alert a1 for j4 is unresolved.
        assert_eq!(store.job_alerts("j4").len(), 1);
    }

    #[test]
    fn first_match_meter_lookup_per_job() {
        let store = Store::new();
        assert_eq!(store.pre_meter("j3").map(|m| m.id.as_str()), Some("m3"));
        assert_eq!(store.post_meter("j3").map(|m| m.id.as_str()), Some("m4"));
        assert!(store.post_meter("j4").is_none());
    }
}
