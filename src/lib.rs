pub mod assistant; // Clinical question assistant
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod scenarios; // Quick form presets
pub mod session; // Working form + regeneration mode
pub mod shift_report; // Shift journal + hand-off report
pub mod worker;

use std::io::Read;
use std::sync::Arc;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use assistant::ClinicalAssistant;
use config::GenerationSettings;
use db::{open_database_or_reset, share, DatabaseError, SqliteNoteLedger, SqliteOfflineQueue};
use models::{AnswerComplexity, ObservationSnapshot, PatientContext};
use pipeline::generation::{
    Collaborators, ConnectivityMonitor, GenerationError, GenerationRequest, InMemoryPatients,
    NoteDispatcher, QueueReconciler,
};
use pipeline::llm::{LlmNoteService, OllamaClient, ServiceError};
use shift_report::ShiftReporter;
use worker::WorkerGate;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Service: {0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Invalid input: {0}")]
    Input(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// What the binary reads on stdin for `generate`.
#[derive(Debug, Deserialize)]
struct CliRequest {
    snapshot: ObservationSnapshot,
    #[serde(default)]
    patient: Option<PatientContext>,
}

enum Command {
    Generate,
    Journal,
    Report,
    Ask,
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = try_run(std::env::args().skip(1).collect()) {
        tracing::error!(error = %e, "Run failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn try_run(args: Vec<String>) -> Result<(), AppError> {
    let force_offline = args.iter().any(|a| a == "--offline");
    let command = match args.iter().find(|a| !a.starts_with("--")).map(String::as_str) {
        None | Some("generate") => Command::Generate,
        Some("journal") => Command::Journal,
        Some("report") => Command::Report,
        Some("ask") => Command::Ask,
        Some(other) => return Err(AppError::UnknownCommand(other.to_string())),
    };

    let complexity = if args.iter().any(|a| a == "--detailed") {
        AnswerComplexity::Detailed
    } else {
        AnswerComplexity::Simple
    };

    let settings = GenerationSettings::from_env();

    let mut input = String::new();
    if matches!(command, Command::Generate | Command::Ask) {
        std::io::stdin().read_to_string(&mut input)?;
    }
    let request = match command {
        Command::Generate => Some(serde_json::from_str::<CliRequest>(&input)?),
        _ => None,
    };

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = share(open_database_or_reset(&db_path)?);

    let client = Arc::new(OllamaClient::new(&settings.ollama_url, settings.timeout_secs)?);
    let connectivity = Arc::new(ConnectivityMonitor::new(false));
    connectivity.set_force_offline(force_offline);

    let patients = request
        .as_ref()
        .and_then(|r| r.patient.clone())
        .into_iter();
    let deps = Collaborators {
        ledger: Arc::new(SqliteNoteLedger::new(conn.clone())),
        queue: Arc::new(SqliteOfflineQueue::new(conn)),
        patients: Arc::new(InMemoryPatients::new(patients)),
        connectivity: connectivity.clone(),
        service: Arc::new(LlmNoteService::new(client.clone(), settings.model.clone())),
    };
    let gate = Arc::new(WorkerGate::new());

    let reconciler = QueueReconciler::new(deps.clone(), gate.clone());
    let came_online = connectivity.set_reachable(client.is_reachable());
    if let Some(report) = reconciler.on_connectivity_change(came_online) {
        eprintln!("{}", report.summary_message());
    }

    match command {
        Command::Journal => {
            println!("{}", ShiftReporter::new(deps, gate).journal()?);
        }
        Command::Report => {
            println!("{}", ShiftReporter::new(deps, gate).generate()?);
        }
        Command::Ask => {
            let assistant = ClinicalAssistant::new(deps.service, gate);
            println!("{}", assistant.ask(&input, complexity)?);
        }
        Command::Generate => {
            let Some(request) = request else {
                return Ok(());
            };
            let patient_id = request.patient.as_ref().map(|p| p.id.clone());
            let dispatcher = NoteDispatcher::new(deps, gate, settings.offline_queue_enabled);
            let outcome = dispatcher.generate(GenerationRequest::new(request.snapshot, patient_id))?;
            tracing::info!(
                note = %outcome.identity,
                offline = outcome.note.is_offline(),
                "Note ready"
            );
            println!("{}", outcome.note.text());
        }
    }

    Ok(())
}
