mod alerts;
mod models;
mod reports;
mod seed;
mod session;
mod store;
mod tui;

use anyhow::{anyhow, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};

use models::{
    format_money, Comment, Customer, FileCategory, FileUpload, MeterDecision, Note, PipelineStage,
    UserRole,
};
use session::Session;
use store::Store;

#[derive(Parser)]
#[command(name = "solarops")]
#[command(about = "Operations CRM for a solar installer - jobs, meters, alerts, pipeline")]
struct Cli {
    /// Act as this role (admin, installer)
    #[arg(long, global = true, default_value = "admin")]
    role: String,

    /// Team for installer logins (e.g. "Team 2")
    #[arg(long, global = true)]
    team: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI summary, active alerts, and pipeline overview
    Dashboard,

    /// List and inspect jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// List customers or add a new one
    Customers {
        #[command(subcommand)]
        command: CustomerCommands,
    },

    /// List, refresh, or resolve operational alerts
    Alerts {
        #[command(subcommand)]
        command: AlertCommands,
    },

    /// Move a job to a pipeline stage
    Stage {
        /// Job ID
        job_id: String,

        /// Target stage key (lead, quoted, won, ..., paid)
        stage: String,
    },

    /// Approve or reject meter applications
    Meter {
        #[command(subcommand)]
        command: MeterCommands,
    },

    /// Invoice lifecycle for a job
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommands,
    },

    /// Add a note to a job
    Note {
        /// Job ID
        job_id: String,
        text: String,
    },

    /// Add a comment to a job
    Comment {
        /// Job ID
        job_id: String,
        text: String,
    },

    /// Record a file upload against a job (metadata only)
    Upload {
        /// Job ID
        job_id: String,

        /// Category (photos, signed_paperwork, meter_docs, other)
        category: String,

        /// File name to record
        filename: String,
    },

    /// Reassign a job to a team
    Assign {
        /// Job ID
        job_id: String,

        /// Team name
        team: String,
    },

    /// Manage teams and installers
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Upcoming installs with per-team capacity warnings
    Calendar {
        /// Number of days ahead to show
        #[arg(short, long, default_value = "14")]
        days: i64,
    },

    /// Conversion, revenue, and team performance
    Reports {
        /// Reporting window in days (30, 90, 365)
        #[arg(short, long, default_value = "90")]
        days: i64,
    },

    /// Show pipeline rules and alert thresholds
    Settings {
        /// Enable or disable the pre-meter override (admin only)
        #[arg(long)]
        override_pre_meter: Option<bool>,
    },

    /// Interactive pipeline board
    Board,
}

#[derive(Subcommand)]
enum JobCommands {
    /// List jobs
    List {
        /// Filter by stage key
        #[arg(short, long)]
        stage: Option<String>,

        /// Filter by assigned team
        #[arg(short, long)]
        team: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show full job details
    Show {
        /// Job ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CustomerCommands {
    /// List all customers
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a customer
    Add {
        name: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum AlertCommands {
    /// List alerts (unresolved by default)
    List {
        /// Include resolved alerts
        #[arg(long)]
        all: bool,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Recompute all alerts from current job and meter state
    Refresh,

    /// Mark an alert as resolved
    Resolve {
        /// Alert ID
        id: String,
    },
}

#[derive(Subcommand)]
enum MeterCommands {
    /// Approve a meter application
    Approve {
        /// Meter application ID
        id: String,
    },

    /// Reject a meter application
    Reject {
        /// Meter application ID
        id: String,

        #[arg(short, long, default_value = "Rejected by admin")]
        reason: String,
    },
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Mark the job invoiced (due in 14 days)
    Send {
        /// Job ID
        job_id: String,
    },

    /// Mark the invoice paid
    Paid {
        /// Job ID
        job_id: String,
    },
}

#[derive(Subcommand)]
enum TeamCommands {
    /// List teams and their installers
    List,

    /// Register a team name
    Add {
        name: String,
    },

    /// Create a new installer, optionally on a team
    AddMember {
        name: String,

        #[arg(short, long)]
        team: Option<String>,
    },

    /// Move an installer to a team (or clear with no --team)
    MoveMember {
        /// User ID
        user_id: String,

        #[arg(short, long)]
        team: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let role = match cli.role.as_str() {
        "admin" => UserRole::Admin,
        "installer" => UserRole::Installer,
        other => return Err(anyhow!("Unknown role '{}' (use admin or installer)", other)),
    };

    let mut store = Store::new();
    let mut session = Session::default();
    session.login(&store.users, role, cli.team.as_deref());

    match cli.command {
        Commands::Dashboard => print_dashboard(&store, &session),

        Commands::Jobs { command } => match command {
            JobCommands::List { stage, team, json } => {
                let stage = match stage {
                    Some(s) => Some(
                        PipelineStage::parse(&s)
                            .ok_or_else(|| anyhow!("Unknown stage '{}'", s))?,
                    ),
                    None => None,
                };
                let jobs: Vec<&models::Job> = store
                    .jobs
                    .iter()
                    .filter(|j| stage.is_none_or(|s| j.pipeline_stage == s))
                    .filter(|j| team.as_deref().is_none_or(|t| j.assigned_team == t))
                    .collect();
                if json {
                    println!("{}", serde_json::to_string_pretty(&jobs)?);
                } else {
                    print_job_table(&store, &jobs);
                }
            }
            JobCommands::Show { id } => print_job_detail(&store, &id),
        },

        Commands::Customers { command } => match command {
            CustomerCommands::List { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&store.customers)?);
                } else {
                    println!("{:<6} {:<20} {:<40} {:<14}", "ID", "NAME", "ADDRESS", "PHONE");
                    println!("{}", "-".repeat(82));
                    for c in &store.customers {
                        println!(
                            "{:<6} {:<20} {:<40} {:<14}",
                            c.id,
                            truncate(&c.name, 18),
                            truncate(&c.address, 38),
                            c.phone
                        );
                    }
                }
            }
            CustomerCommands::Add { name, address, phone, email } => {
                let id = store.next_id("c");
                store.add_customer(Customer { id: id.clone(), name, address, phone, email });
                println!("Added customer {}", id);
            }
        },

        Commands::Alerts { command } => match command {
            AlertCommands::List { all, json } => {
                let alerts: Vec<&models::Alert> =
                    store.alerts.iter().filter(|a| all || !a.resolved).collect();
                if json {
                    println!("{}", serde_json::to_string_pretty(&alerts)?);
                } else if alerts.is_empty() {
                    println!("No active alerts.");
                } else {
                    for alert in alerts {
                        let mark = if alert.resolved { "resolved" } else { alert.severity.as_str() };
                        println!("[{:<8}] {:<18} {} ({})", mark, alert.id, alert.message, alert.job_id);
                    }
                }
            }
            AlertCommands::Refresh => {
                store.refresh_alerts();
                println!("Alerts recomputed: {} active.", store.active_alerts().len());
                for alert in store.active_alerts() {
                    println!("  [{}] {}", alert.severity.as_str(), alert.message);
                }
            }
            AlertCommands::Resolve { id } => {
                if store.resolve_alert(&id) {
                    println!("Alert {} resolved (until the next refresh).", id);
                } else {
                    println!("Alert {} not found.", id);
                }
            }
        },

        Commands::Stage { job_id, stage } => {
            let stage = PipelineStage::parse(&stage).ok_or_else(|| {
                let keys: Vec<&str> = PipelineStage::ALL.iter().map(|s| s.as_str()).collect();
                anyhow!("Unknown stage '{}'. Valid stages: {}", stage, keys.join(", "))
            })?;
            if store.move_job_stage(&job_id, stage, session.user_name()) {
                println!("Job {} moved to {}.", job_id, stage.label());
            } else if store.job(&job_id).is_none() {
                println!("Job {} not found.", job_id);
            } else {
                println!(
                    "Blocked: {} needs an approved pre-meter application before it can be \
                     installed (or enable the pre-meter override in settings).",
                    job_id
                );
            }
        }

        Commands::Meter { command } => match command {
            MeterCommands::Approve { id } => {
                if store.decide_meter(&id, MeterDecision::Approve, session.user_name()) {
                    println!("Meter application {} approved.", id);
                } else {
                    println!("Meter application {} not found.", id);
                }
            }
            MeterCommands::Reject { id, reason } => {
                if store.decide_meter(&id, MeterDecision::Reject { reason }, session.user_name()) {
                    println!("Meter application {} rejected.", id);
                } else {
                    println!("Meter application {} not found.", id);
                }
            }
        },

        Commands::Invoice { command } => match command {
            InvoiceCommands::Send { job_id } => {
                if store.mark_invoiced(&job_id) {
                    let job = store.job(&job_id).ok_or_else(|| anyhow!("job vanished"))?;
                    println!(
                        "Job {} invoiced for {}, due {}.",
                        job_id,
                        format_money(job.project_price),
                        job.invoice_due_date.map_or(String::new(), |d| d.to_string())
                    );
                } else {
                    println!("Job {} not found or already invoiced.", job_id);
                }
            }
            InvoiceCommands::Paid { job_id } => {
                if store.mark_paid(&job_id) {
                    println!("Job {} marked paid.", job_id);
                } else {
                    println!("Job {} not found or not awaiting payment.", job_id);
                }
            }
        },

        Commands::Note { job_id, text } => {
            let id = store.next_id("n");
            store.add_note(Note {
                id: id.clone(),
                job_id,
                text,
                created_at: Local::now().naive_local(),
                created_by: session.user_name().to_string(),
            });
            println!("Note {} added.", id);
        }

        Commands::Comment { job_id, text } => {
            let id = store.next_id("cm");
            store.add_comment(Comment {
                id: id.clone(),
                job_id,
                text,
                created_at: Local::now().naive_local(),
                created_by: session.user_name().to_string(),
            });
            println!("Comment {} added.", id);
        }

        Commands::Upload { job_id, category, filename } => {
            let category = FileCategory::parse(&category).ok_or_else(|| {
                anyhow!(
                    "Unknown category '{}' (photos, signed_paperwork, meter_docs, other)",
                    category
                )
            })?;
            let id = store.next_id("f");
            store.add_file(FileUpload {
                id: id.clone(),
                job_id,
                category,
                filename,
                uploaded_at: Local::now().naive_local(),
                uploaded_by: session.user_name().to_string(),
                url: "#".to_string(),
            });
            println!("File {} recorded.", id);
        }

        Commands::Assign { job_id, team } => {
            if store.assign_team(&job_id, &team, session.user_name()) {
                println!("Job {} assigned to {}.", job_id, team);
            } else {
                println!("Job {} not found.", job_id);
            }
        }

        Commands::Team { command } => match command {
            TeamCommands::List => {
                for team in &store.teams {
                    let members: Vec<&str> = store
                        .installers()
                        .into_iter()
                        .filter(|u| u.team.as_deref() == Some(team.as_str()))
                        .map(|u| u.name.as_str())
                        .collect();
                    let jobs = store.jobs.iter().filter(|j| j.assigned_team == *team).count();
                    println!("{} ({} jobs)", team, jobs);
                    if members.is_empty() {
                        println!("  no members assigned");
                    } else {
                        for name in members {
                            println!("  {}", name);
                        }
                    }
                }
                let unassigned: Vec<&str> = store
                    .installers()
                    .into_iter()
                    .filter(|u| u.team.is_none())
                    .map(|u| u.name.as_str())
                    .collect();
                if !unassigned.is_empty() {
                    println!("Unassigned: {}", unassigned.join(", "));
                }
            }
            TeamCommands::Add { name } => {
                store.add_team(&name);
                println!("Teams: {}", store.teams.join(", "));
            }
            TeamCommands::AddMember { name, team } => {
                match store.add_team_member(&name, team.as_deref()) {
                    Some(id) => println!("Added installer {} ({})", name, id),
                    None => println!("Member name cannot be empty."),
                }
            }
            TeamCommands::MoveMember { user_id, team } => {
                if store.update_user_team(&user_id, team.as_deref()) {
                    match team {
                        Some(team) => println!("User {} moved to {}.", user_id, team),
                        None => println!("User {} removed from their team.", user_id),
                    }
                } else {
                    println!("User {} not found.", user_id);
                }
            }
        },

        Commands::Calendar { days } => print_calendar(&store, days),

        Commands::Reports { days } => print_reports(&store, days),

        Commands::Settings { override_pre_meter } => {
            if let Some(value) = override_pre_meter {
                if !session.is_admin() {
                    println!("Only admins can change the pre-meter override.");
                } else {
                    store.set_override_pre_meter(value);
                    println!(
                        "Pre-meter override {}.",
                        if value { "enabled" } else { "disabled" }
                    );
                }
            }
            print_settings(&store);
        }

        Commands::Board => {
            tui::run_board(&mut store, &session)?;
        }
    }

    Ok(())
}

fn print_dashboard(store: &Store, session: &Session) {
    let now = Local::now().naive_local();
    let summary = reports::dashboard(store, now);

    println!("Dashboard — welcome back, {}", session.user_name());
    println!();
    println!("{:<22} {}", "Total jobs", summary.total_jobs);
    println!("{:<22} {}", "Scheduled this week", summary.scheduled_this_week);
    println!("{:<22} {}", "Waiting pre-meter", summary.waiting_pre_meter);
    println!("{:<22} {}", "Waiting post-meter", summary.waiting_post_meter);
    println!("{:<22} {}", "Not invoiced", summary.installed_not_invoiced);
    println!("{:<22} {}", "Unpaid invoices", summary.invoiced_not_paid);
    println!();
    println!(
        "Revenue forecast (next 30 days): {}",
        format_money(summary.revenue_forecast)
    );

    let active = store.active_alerts();
    println!();
    if active.is_empty() {
        println!("No active alerts.");
    } else {
        println!("Active alerts ({}):", active.len());
        for alert in active {
            println!("  [{:<6}] {} ({})", alert.severity.as_str(), alert.message, alert.job_id);
        }
    }

    println!();
    println!("Pipeline:");
    for (stage, count) in reports::stage_counts(&store.jobs) {
        if count > 0 {
            println!("  {:<22} {}", stage.label(), count);
        }
    }
}

fn print_job_table(store: &Store, jobs: &[&models::Job]) {
    if jobs.is_empty() {
        println!("No jobs found.");
        return;
    }
    println!(
        "{:<5} {:<22} {:<18} {:<8} {:>10} {:<8}",
        "ID", "STAGE", "CUSTOMER", "SYSTEM", "PRICE", "TEAM"
    );
    println!("{}", "-".repeat(78));
    for job in jobs {
        let customer = store
            .customer(&job.customer_id)
            .map_or("Unknown", |c| c.name.as_str());
        println!(
            "{:<5} {:<22} {:<18} {:<8} {:>10} {:<8}",
            job.id,
            job.pipeline_stage.label(),
            truncate(customer, 16),
            job.system_type.as_str(),
            format_money(job.project_price),
            job.assigned_team
        );
    }
}

fn print_job_detail(store: &Store, id: &str) {
    let Some(job) = store.job(id) else {
        println!("Job {} not found.", id);
        return;
    };

    println!("Job {}", job.id);
    if let Some(customer) = store.customer(&job.customer_id) {
        println!("Customer: {} ({}, {})", customer.name, customer.phone, customer.address);
    }
    println!(
        "System: {} {}kW, price {}",
        job.system_type.as_str(),
        job.system_size_kw,
        format_money(job.project_price)
    );
    println!("Stage: {}", job.pipeline_stage.label());
    println!("Team: {}", job.assigned_team);
    if job.deposit_paid {
        println!(
            "Deposit: {} on {}",
            format_money(job.deposit_amount),
            job.deposit_date.map_or(String::new(), |d| d.to_string())
        );
    }
    if let Some(date) = job.install_date {
        println!("Install date: {}", date);
    }
    println!("ETA completion: {}", job.eta_completion_date);
    print!("Invoice: {}", job.invoice_status.as_str());
    if let Some(date) = job.invoice_date {
        print!(" (sent {}", date);
        if let Some(due) = job.invoice_due_date {
            print!(", due {}", due);
        }
        print!(")");
    }
    if let Some(date) = job.paid_date {
        print!(" paid {}", date);
    }
    println!();

    let meters = store.job_meters(id);
    if !meters.is_empty() {
        println!("\nMeter applications:");
        for meter in meters {
            print!(
                "  {} {} submitted {} — {}",
                meter.id,
                meter.meter_type.as_str(),
                meter.date_submitted,
                meter.status.as_str()
            );
            if let Some(date) = meter.approval_date {
                print!(" {}", date);
            }
            if let Some(reason) = &meter.rejection_reason {
                print!(" ({})", reason);
            }
            println!();
        }
    }

    let alerts = store.job_alerts(id);
    if !alerts.is_empty() {
        println!("\nAlerts:");
        for alert in alerts {
            println!("  [{}] {}", alert.severity.as_str(), alert.message);
        }
    }

    let notes = store.job_notes(id);
    if !notes.is_empty() {
        println!("\nNotes:");
        for note in notes {
            println!("  {} — {}", note.created_by, note.text);
        }
    }

    let comments = store.job_comments(id);
    if !comments.is_empty() {
        println!("\nComments:");
        for comment in comments {
            println!("  {} — {}", comment.created_by, comment.text);
        }
    }

    let files = store.job_files(id);
    if !files.is_empty() {
        println!("\nFiles:");
        for file in files {
            println!("  [{}] {}", file.category.as_str(), file.filename);
        }
    }

    let timeline = store.job_timeline(id);
    if !timeline.is_empty() {
        println!("\nTimeline:");
        for event in timeline {
            println!(
                "  {} {} ({})",
                event.created_at.format("%Y-%m-%d"),
                event.description,
                event.created_by
            );
        }
    }
}

fn print_calendar(store: &Store, days: i64) {
    let today = Local::now().date_naive();
    let mut any = false;
    for offset in 0..days {
        let date = today + Duration::days(offset);
        let installs = reports::installs_on(store, date);
        if installs.is_empty() {
            continue;
        }
        any = true;
        let warning = if reports::day_over_capacity(store, date) {
            "  [over capacity]"
        } else {
            ""
        };
        println!("{}{}", date, warning);
        for job in installs {
            let customer = store
                .customer(&job.customer_id)
                .map_or("Unknown", |c| c.name.as_str());
            println!(
                "  {} {} — {} ({}kW {})",
                job.id, job.assigned_team, customer, job.system_size_kw,
                job.system_type.as_str()
            );
        }
    }
    if !any {
        println!("No installs scheduled in the next {} days.", days);
    }
}

fn print_reports(store: &Store, days: i64) {
    let summary = reports::report(store, Local::now().naive_local(), days);

    println!("Reports (last {} days)", days);
    println!();
    println!("{:<26} {}%", "Conversion (quoted→won)", summary.conversion_rate);
    println!("{:<26} {} days", "Avg deposit to install", summary.avg_deposit_to_install_days);
    println!("{:<26} {}", "Total revenue", format_money(summary.total_revenue));
    println!("{:<26} {}", "Total customers", summary.total_customers);

    if !summary.completed_by_month.is_empty() {
        println!("\nJobs completed per month:");
        for (month, count) in &summary.completed_by_month {
            println!("  {:<8} {}", month, count);
        }
    }

    if !summary.revenue_by_month.is_empty() {
        println!("\nRevenue per month:");
        for (month, revenue) in &summary.revenue_by_month {
            println!("  {:<8} {}", month, format_money(*revenue));
        }
    }

    println!("\nTeam performance (installed jobs):");
    for (team, count) in &summary.team_performance {
        println!("  {:<8} {}", team, count);
    }

    println!("\nPipeline distribution:");
    for (bucket, count) in summary.distribution {
        println!("  {:<12} {}", bucket, count);
    }
}

fn print_settings(store: &Store) {
    println!("Pipeline rules:");
    println!(
        "  Pre-meter override: {}",
        if store.override_pre_meter() { "ON" } else { "off" }
    );
    println!("\nAlert thresholds (fixed):");
    println!("  Pre-meter pending threshold     {} days", alerts::PRE_METER_PENDING_DAYS);
    println!("  Install warning threshold       {} days before", alerts::INSTALL_WARNING_DAYS);
    println!("  Post-meter submission deadline  {} days after install", alerts::POST_METER_DEADLINE_DAYS);
    println!("  Invoice overdue threshold       {} days", alerts::INVOICE_OVERDUE_DAYS);
    println!("  Max jobs per team per day       {}", reports::MAX_JOBS_PER_TEAM_PER_DAY);
    println!("\nSystem info:");
    println!(
        "  Data: in-memory seed ({} jobs, {} customers), volatile per run",
        store.jobs.len(),
        store.customers.len()
    );
    println!("  Authentication: mock role-based (--role, --team)");
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
