//! PMO CLI - weight allocation, progress rollup and time tracking.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pmo_core::{
    Config, CorrectionId, CorrectionRequest, CorrectionState, Initiative, InitiativeKind, MemberId, Role,
    RoleAssignment, Snapshot, TimeLogEntry, TimeLogId, WorkItem, WorkItemId, WorkSchedule, WorkTree, Workflow,
};
use pmo_progress::{RollupEngine, WeightEngine};
use pmo_storage::{JsonStorage, Storage};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Parser)]
#[command(name = "pmo")]
#[command(about = "Project weight, progress and time tracking", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, global = true, default_value = ".pmo")]
    data_dir: PathBuf,

    /// Initiative code; optional when only one initiative exists
    #[arg(long, short, global = true)]
    initiative: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an initiative
    Init {
        /// Initiative code
        code: String,
        /// Display name
        name: String,
        /// Kind of initiative
        #[arg(long, value_enum, default_value = "delivery")]
        kind: KindArg,
        /// Total budget in person-days
        #[arg(long, default_value = "0")]
        budget: f64,
    },
    /// List initiatives
    List,
    /// Advance the initiative status
    Advance,
    /// Add a work item
    Add {
        /// Item name
        name: String,
        /// Parent item code
        #[arg(long)]
        parent: Option<String>,
    },
    /// Remove a work item and its subtree
    Remove {
        /// Item code
        code: String,
    },
    /// Renumber the children of an item
    Reindex {
        /// Item code
        code: String,
    },
    /// Set an item's entry weight
    Weight {
        /// Item code
        code: String,
        /// Percentage of the root
        value: f64,
    },
    /// Split an item's weight evenly across its children
    Even {
        /// Item code
        code: String,
    },
    /// Re-derive descendant weights from relative weights
    Resync {
        /// Item code; every root when omitted
        code: Option<String>,
    },
    /// Lifecycle transition on an item
    Item {
        /// Transition to apply
        #[arg(value_enum)]
        action: ItemAction,
        /// Item code
        code: String,
    },
    /// Start a timer
    Start {
        /// Item code
        code: String,
        /// Member ID
        #[arg(long)]
        member: String,
    },
    /// Stop a timer
    Stop {
        /// Item code
        code: String,
        /// Member ID
        #[arg(long)]
        member: String,
    },
    /// Pause a running timer
    Pause {
        /// Item code
        code: String,
        /// Member ID
        #[arg(long)]
        member: String,
    },
    /// Resume a paused timer
    Resume {
        /// Item code
        code: String,
        /// Member ID
        #[arg(long)]
        member: String,
    },
    /// Record a finished interval ("YYYY-MM-DD HH:MM")
    Log {
        /// Item code
        code: String,
        /// Start time
        start: String,
        /// End time
        end: String,
    },
    /// Request a correction of an existing log
    Correct {
        /// Time log ID
        log: String,
        /// Corrected start
        start: String,
        /// Corrected end
        end: String,
    },
    /// Approve or reject a correction request
    Review {
        /// Correction ID
        id: String,
        /// Reject instead of approve
        #[arg(long)]
        reject: bool,
    },
    /// Work hours between two instants on one day
    Hours {
        /// Start time
        start: String,
        /// End time
        end: String,
    },
    /// Define a role
    Role {
        /// Role name
        name: String,
        /// Share of the initiative in percent
        percentage: f64,
    },
    /// Assign a member to a role
    Assign {
        /// Role name
        role: String,
        /// Member ID
        member: String,
    },
    /// Show team shares
    Team,
    /// Show the rollup report
    Report,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Delivery,
    Maintenance,
    Ticket,
    Other,
}

impl From<KindArg> for InitiativeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Delivery => InitiativeKind::Delivery,
            KindArg::Maintenance => InitiativeKind::Maintenance,
            KindArg::Ticket => InitiativeKind::Ticket,
            KindArg::Other => InitiativeKind::Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ItemAction {
    Confirm,
    Reject,
    Cancel,
    Draft,
    Hold,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Open storage
    let mut storage = JsonStorage::new(&cli.data_dir).await?;
    let config = storage.load_config().await?;

    match cli.command {
        Commands::Init { code, name, kind, budget } => {
            let initiative = Initiative::new(code, name, kind.into(), budget);
            let snapshot = Snapshot::new(
                initiative,
                WorkTree::new(config.code_prefix.clone()),
                WorkSchedule::office_hours(),
            );
            storage.save_snapshot(&snapshot).await?;
            println!("Created initiative: {} - {}", snapshot.initiative.code, snapshot.initiative.name);
        }
        Commands::List => {
            let snapshots = storage.list_snapshots().await?;
            println!("Initiatives ({})", snapshots.len());
            for snapshot in snapshots {
                let initiative = &snapshot.initiative;
                println!(
                    "  {} | {} | {} items - {}",
                    initiative.code,
                    initiative.status.as_str(),
                    snapshot.tree.len(),
                    initiative.name,
                );
            }
        }
        Commands::Hours { start, end } => {
            let schedule = match select(&storage, cli.initiative.as_deref()).await {
                Ok(snapshot) => snapshot.schedule,
                Err(_) => WorkSchedule::office_hours(),
            };
            let hours = pmo_calendar::compute_hours(parse_time(&start)?, parse_time(&end)?, &schedule)?;
            println!("{:.2} h", hours);
        }
        command => {
            let mut snapshot = select(&storage, cli.initiative.as_deref()).await?;
            let changed = execute(command, &mut snapshot, &config)?;
            if changed {
                let engine = RollupEngine::new(config.clone());
                let report = engine.run(
                    &snapshot.tree,
                    &snapshot.time_logs,
                    &snapshot.schedule,
                    snapshot.initiative.budget,
                )?;
                report.apply(&mut snapshot.tree)?;
                let version = storage.save_snapshot(&snapshot).await?;
                info!(initiative = %snapshot.initiative.code, version, "saved");
            }
        }
    }

    Ok(())
}

/// Run a command against a loaded snapshot. Returns whether it needs saving.
fn execute(command: Commands, snapshot: &mut Snapshot, config: &Config) -> Result<bool> {
    let weights = WeightEngine::new(config.clone());

    match command {
        Commands::Init { .. } | Commands::List | Commands::Hours { .. } => Ok(false),
        Commands::Advance => {
            let status = snapshot.initiative.confirm()?;
            println!("{} is now {}", snapshot.initiative.code, status.as_str());
            Ok(true)
        }
        Commands::Add { name, parent } => {
            let tree = &mut snapshot.tree;
            let id = match parent {
                Some(code) => {
                    let parent = lookup(tree, &code)?;
                    tree.add_child(parent, name)?
                }
                None if snapshot.initiative.kind == InitiativeKind::Ticket => {
                    tree.add_root_with(name, Workflow::ticket())
                }
                None => tree.add_root(name),
            };
            let item = tree.get(id)?;
            println!("Added item: {} - {}", item.code, item.name);
            if let Some(missing) = &item.missing_from {
                println!("  Code {} is unused", missing);
            }
            Ok(true)
        }
        Commands::Remove { code } => {
            let id = lookup(&snapshot.tree, &code)?;
            let removed = snapshot.tree.remove(id)?;
            drop_orphans(snapshot, &removed);
            println!("Removed {} item(s)", removed.len());
            Ok(true)
        }
        Commands::Reindex { code } => {
            let id = lookup(&snapshot.tree, &code)?;
            snapshot.tree.reindex(id)?;
            Ok(true)
        }
        Commands::Weight { code, value } => {
            let id = lookup(&snapshot.tree, &code)?;
            weights.set_entry_weight(&mut snapshot.tree, id, value)?;
            Ok(true)
        }
        Commands::Even { code } => {
            let id = lookup(&snapshot.tree, &code)?;
            weights.redistribute_evenly(&mut snapshot.tree, id)?;
            Ok(true)
        }
        Commands::Resync { code } => {
            match code {
                Some(code) => {
                    let id = lookup(&snapshot.tree, &code)?;
                    weights.resync(&mut snapshot.tree, id)?;
                }
                None => weights.resync_all(&mut snapshot.tree)?,
            }
            Ok(true)
        }
        Commands::Item { action, code } => {
            let id = lookup(&snapshot.tree, &code)?;
            let tree = &mut snapshot.tree;
            match action {
                ItemAction::Confirm => {
                    pmo_progress::confirm(tree, id, &snapshot.time_logs)?;
                }
                ItemAction::Reject => pmo_progress::reject(tree, id)?,
                ItemAction::Cancel => pmo_progress::cancel(tree, id)?,
                ItemAction::Draft => pmo_progress::set_to_draft(tree, id)?,
                ItemAction::Hold => pmo_progress::hold(tree, id)?,
            }
            println!("{} is now {}", code, tree.get(id)?.workflow.label());
            Ok(true)
        }
        Commands::Start { code, member } => {
            let id = lookup(&snapshot.tree, &code)?;
            let member = parse_member(&member)?;
            let log = pmo_progress::start_timer(&mut snapshot.tree, id, &mut snapshot.time_logs, member, now(config))?;
            println!("Started log {}", log);
            Ok(true)
        }
        Commands::Stop { code, member } => {
            let id = lookup(&snapshot.tree, &code)?;
            let member = parse_member(&member)?;
            let log = pmo_progress::stop_timer(&mut snapshot.time_logs, id, member, now(config))?;
            println!("Stopped log {}", log);
            Ok(true)
        }
        Commands::Pause { code, member } => {
            let id = lookup(&snapshot.tree, &code)?;
            let member = parse_member(&member)?;
            let log = pmo_progress::pause_timer(&mut snapshot.time_logs, id, member, now(config))?;
            println!("Paused log {}", log);
            Ok(true)
        }
        Commands::Resume { code, member } => {
            let id = lookup(&snapshot.tree, &code)?;
            let member = parse_member(&member)?;
            let log = pmo_progress::resume_timer(&mut snapshot.time_logs, id, member, now(config))?;
            println!("Resumed log {}", log);
            Ok(true)
        }
        Commands::Log { code, start, end } => {
            let id = lookup(&snapshot.tree, &code)?;
            let (start, end) = (parse_time(&start)?, parse_time(&end)?);
            let hours = pmo_calendar::compute_hours(start, end, &snapshot.schedule)?;
            let log = TimeLogEntry::closed(id, start, end);
            println!("Logged {} ({:.2} h)", log.id, hours);
            snapshot.time_logs.push(log);
            Ok(true)
        }
        Commands::Correct { log, start, end } => {
            let log_id: TimeLogId = log.parse().map_err(|_| anyhow!("Invalid time log ID"))?;
            let target = snapshot
                .time_logs
                .iter()
                .find(|log| log.id == log_id)
                .ok_or_else(|| anyhow!("Time log not found: {}", log))?;
            let request = CorrectionRequest::correct(target, parse_time(&start)?, parse_time(&end)?);
            println!("Requested correction {}", request.id);
            snapshot.corrections.push(request);
            Ok(true)
        }
        Commands::Review { id, reject } => {
            let request_id: CorrectionId = id.parse().map_err(|_| anyhow!("Invalid correction ID"))?;
            let request = snapshot
                .corrections
                .iter_mut()
                .find(|request| request.id == request_id && request.state == CorrectionState::Pending)
                .ok_or_else(|| anyhow!("No pending correction: {}", id))?;
            if reject {
                request.reject()?;
                println!("Rejected correction {}", id);
            } else {
                let log = request.approve(&mut snapshot.time_logs)?;
                println!("Approved correction {} into log {}", id, log);
            }
            Ok(true)
        }
        Commands::Role { name, percentage } => {
            let role = Role::new(name, percentage);
            println!("Added role: {} ({}%)", role.name, role.total_percentage);
            snapshot.roles.push(role);
            Ok(true)
        }
        Commands::Assign { role, member } => {
            let role = snapshot
                .roles
                .iter()
                .find(|r| r.name == role)
                .ok_or_else(|| anyhow!("Role not found: {}", role))?;
            let mut assignment = RoleAssignment::new(snapshot.initiative.id, parse_member(&member)?, role);
            assignment.sequence = snapshot.assignments.len() as u32 + 1;
            snapshot.assignments.push(assignment);
            Ok(true)
        }
        Commands::Team => {
            let shares = pmo_team::distribute(&snapshot.assignments);
            println!("Team ({})", pmo_team::team_members(&snapshot.assignments, snapshot.initiative.id).len());
            for assignment in &snapshot.assignments {
                let role = snapshot
                    .roles
                    .iter()
                    .find(|r| r.id == assignment.role)
                    .map(|r| r.name.as_str())
                    .unwrap_or("?");
                let share = shares.get(&assignment.id).copied().unwrap_or(0.0);
                println!("  {} | {} | {:.2}%", assignment.member, role, share);
            }
            Ok(false)
        }
        Commands::Report => {
            print_report(snapshot, config)?;
            Ok(false)
        }
    }
}

fn print_report(snapshot: &Snapshot, config: &Config) -> Result<()> {
    let engine = RollupEngine::new(config.clone());
    let report = engine.run(
        &snapshot.tree,
        &snapshot.time_logs,
        &snapshot.schedule,
        snapshot.initiative.budget,
    )?;

    let initiative = &report.initiative;
    println!("{} - {}", snapshot.initiative.code, snapshot.initiative.name);
    println!("  Status: {}", snapshot.initiative.status.as_str());
    println!("  Progress: {:.1}%", initiative.progress);
    println!("  Effort: {:.2} / {:.2} days", initiative.actual_effort, initiative.budget);
    if let (Some(start), Some(end)) = (initiative.dates.start, initiative.dates.end) {
        println!("  Logged: {} .. {}", start, end);
    }

    for root in snapshot.tree.roots() {
        for id in snapshot.tree.subtree(*root)? {
            let item = snapshot.tree.get(id)?;
            let Some(rollup) = report.items.get(&id) else {
                continue;
            };
            let depth = item.code.matches('.').count();
            println!(
                "  {}{} {} [{}] weight {:.1}% ({:.1}% of parent) | budget {:.2} | actual {:.2} | progress {:.1}% | quality {:.1}",
                "  ".repeat(depth),
                item.code,
                item.name,
                item.workflow.label(),
                item.entry_weight,
                item.relative_weight,
                rollup.budgeted_effort,
                rollup.actual_effort,
                rollup.progress,
                rollup.quality,
            );
        }
    }
    Ok(())
}

/// Drop the time logs and correction requests of removed items.
fn drop_orphans(snapshot: &mut Snapshot, removed: &[WorkItem]) {
    let gone = |item: WorkItemId| removed.iter().any(|r| r.id == item);
    snapshot.time_logs.retain(|log| !gone(log.work_item));
    snapshot.corrections.retain(|request| !gone(request.work_item));
}

/// Load the initiative named by `code`, or the only one stored.
async fn select(storage: &JsonStorage, code: Option<&str>) -> Result<Snapshot> {
    let snapshots = storage.list_snapshots().await?;
    match code {
        Some(code) => snapshots
            .into_iter()
            .find(|snapshot| snapshot.initiative.code == code)
            .ok_or_else(|| anyhow!("Initiative not found: {}", code)),
        None => {
            let mut snapshots = snapshots.into_iter();
            match (snapshots.next(), snapshots.next()) {
                (Some(snapshot), None) => Ok(snapshot),
                (None, _) => bail!("No initiative yet; run `pmo init` first"),
                (Some(_), Some(_)) => bail!("Several initiatives exist; pass --initiative"),
            }
        }
    }
}

fn lookup(tree: &WorkTree, code: &str) -> Result<WorkItemId> {
    tree.find_by_code(code)
        .map(|item| item.id)
        .ok_or_else(|| anyhow!("Item not found: {}", code))
}

fn parse_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .with_context(|| format!("Invalid time {:?}, expected {}", s, TIME_FORMAT))
}

fn parse_member(s: &str) -> Result<MemberId> {
    s.parse().map_err(|_| anyhow!("Invalid member ID: {}", s))
}

fn now(config: &Config) -> NaiveDateTime {
    Utc::now().with_timezone(&config.utc_offset()).naive_local()
}
