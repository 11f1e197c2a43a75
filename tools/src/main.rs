//! desk-runner: headless runner for the CivicDesk engine.
//!
//! Usage:
//!   desk-runner --db desk.db --topology topology.json --settings escalation.json
//!   desk-runner --db desk.db --ipc-mode
//!
//! IPC mode reads one JSON command per stdin line and writes one JSON
//! response per line. Without it, the runner prints a statistics summary
//! and exits.

use anyhow::Result;
use civic_core::{
    clock::SystemClock,
    complaint::Status,
    config::{EscalationSettings, StatsConfig, Topology},
    desk::{ComplaintDesk, SubmitRequest},
    notify::LogSink,
    store::DeskStore,
    types::Role,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Submit {
        citizen_id: String,
        #[serde(flatten)]
        request: SubmitRequest,
    },
    UpdateStatus {
        actor_id: String,
        role: Role,
        complaint_id: String,
        status: Status,
        comment: Option<String>,
    },
    UpdateProgress {
        actor_id: String,
        role: Role,
        complaint_id: String,
        progress: i64,
        notes: Option<String>,
    },
    Reassign {
        actor_id: String,
        role: Role,
        complaint_id: String,
        assignee_id: String,
    },
    Vote {
        actor_id: Option<String>,
        complaint_id: String,
    },
    Get {
        complaint_id: String,
    },
    Timeline {
        complaint_id: String,
    },
    Stats {
        actor_id: String,
        role: Role,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let topology_path = flag_value(&args, "--topology");
    let settings_path = flag_value(&args, "--settings");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;

    let topology = match topology_path {
        Some(p) => Topology::load(Path::new(p))?,
        None => Topology::default(),
    };
    let settings = match settings_path {
        Some(p) => EscalationSettings::load(Path::new(p))?,
        None => EscalationSettings::default(),
    };

    let desk = ComplaintDesk::new(
        store,
        topology,
        settings,
        StatsConfig::default(),
        Box::new(SystemClock),
        Box::new(LogSink),
    )?;

    if ipc_mode {
        run_ipc_loop(&desk)?;
    } else {
        print_summary(&desk)?;
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn run_ipc_loop(desk: &ComplaintDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buffer = String::new();
    let mut handle = stdin.lock();

    loop {
        buffer.clear();
        if handle.read_line(&mut buffer)? == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("unparseable ipc command: {e}");
                respond(&mut stdout, &serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }
        let response = handle_command(desk, cmd);
        let payload = match response {
            Ok(value) => value,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        respond(&mut stdout, &payload)?;
    }
    Ok(())
}

fn handle_command(desk: &ComplaintDesk, cmd: IpcCommand) -> Result<serde_json::Value> {
    let value = match cmd {
        IpcCommand::Submit {
            citizen_id,
            request,
        } => serde_json::to_value(desk.submit(&citizen_id, Role::Citizen, request)?)?,
        IpcCommand::UpdateStatus {
            actor_id,
            role,
            complaint_id,
            status,
            comment,
        } => serde_json::to_value(desk.update_status(
            &actor_id,
            role,
            &complaint_id,
            status,
            comment,
            vec![],
        )?)?,
        IpcCommand::UpdateProgress {
            actor_id,
            role,
            complaint_id,
            progress,
            notes,
        } => serde_json::to_value(desk.update_progress(
            &actor_id,
            role,
            &complaint_id,
            progress,
            notes,
            vec![],
        )?)?,
        IpcCommand::Reassign {
            actor_id,
            role,
            complaint_id,
            assignee_id,
        } => serde_json::to_value(desk.reassign(&actor_id, role, &complaint_id, &assignee_id)?)?,
        IpcCommand::Vote {
            actor_id,
            complaint_id,
        } => serde_json::to_value(desk.vote(actor_id.as_deref(), &complaint_id)?)?,
        IpcCommand::Get { complaint_id } => serde_json::to_value(desk.complaint(&complaint_id)?)?,
        IpcCommand::Timeline { complaint_id } => {
            serde_json::to_value(desk.timeline(&complaint_id)?)?
        }
        IpcCommand::Stats { actor_id, role } => {
            serde_json::to_value(desk.stats(&actor_id, role)?)?
        }
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn respond(stdout: &mut io::Stdout, payload: &serde_json::Value) -> Result<()> {
    writeln!(stdout, "{payload}")?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(desk: &ComplaintDesk) -> Result<()> {
    let stats = desk.stats("runner", Role::Admin)?;
    println!("CivicDesk summary");
    println!("  complaints:          {}", stats.total);
    for (status, count) in &stats.by_status {
        println!("    {status:<18} {count}");
    }
    println!("  resolved:            {}", stats.resolved_count);
    println!("  avg resolution days: {:.1}", stats.avg_resolution_days);
    println!("  no work started:     {}", stats.no_work_started);
    println!("  overdue:             {}", stats.overdue);
    for load in &stats.per_assignee {
        println!(
            "  assignee {:<12} open={} resolved={} rate={:.0}%",
            load.assignee_id,
            load.open,
            load.resolved,
            load.resolution_rate * 100.0,
        );
    }
    Ok(())
}
