use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use providers::firebase::{FirebaseConfig, FirebaseStore};
use providers::memory::MemoryStore;
use providers::{BlobStore, DocumentStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use survey_core::config::{self, AppConfig};
use survey_core::session::{Phase, SurveySession};
use survey_core::usage::UsageIndex;
use survey_core::{admin, catalog, export, materialize, selection};
use tracing::warn;

mod prompt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Take {
            name,
            email,
            skip_demographics,
            seed,
        } => run_take(cfg, name, email, skip_demographics, seed).await,
        Commands::Status { json } => run_status(cfg, json).await,
        Commands::Export {
            format,
            out,
            password,
        } => run_export(cfg, &format, out, password).await,
    }
}

#[derive(Parser)]
#[command(name = "engage-survey")]
#[command(about = "Classroom engagement survey runner", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take one survey session in the terminal
    Take {
        /// Participant name (skips the prompt)
        #[arg(long)]
        name: Option<String>,
        /// Participant email (skips the prompt)
        #[arg(long)]
        email: Option<String>,
        /// Skip the demographics prompts
        #[arg(long, default_value_t = false)]
        skip_demographics: bool,
        /// Seed for the folder draw (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the remaining folder pool per dataset
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Export collected data as CSV (password-gated)
    Export {
        /// Export format: dataset | sessions
        #[arg(long, default_value = "dataset")]
        format: String,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
        /// Admin password; falls back to the ADMIN_PASSWORD env variable
        #[arg(long)]
        password: Option<String>,
    },
}

fn build_stores(cfg: &AppConfig) -> (Arc<dyn DocumentStore>, Arc<dyn BlobStore>) {
    if cfg.store.provider == "firebase" {
        if let (Some(project_id), Some(bucket)) = (&cfg.store.project_id, &cfg.store.bucket) {
            let store = Arc::new(FirebaseStore::new(FirebaseConfig {
                project_id: project_id.clone(),
                bucket: bucket.clone(),
                api_key: std::env::var("FIREBASE_API_KEY").ok(),
            }));
            return (store.clone() as Arc<dyn DocumentStore>, store as Arc<dyn BlobStore>);
        }
        warn!("firebase provider selected but project_id/bucket missing; using in-memory store");
    }
    let store = Arc::new(MemoryStore::new());
    (store.clone() as Arc<dyn DocumentStore>, store as Arc<dyn BlobStore>)
}

async fn run_take(
    cfg: AppConfig,
    name: Option<String>,
    email: Option<String>,
    skip_demographics: bool,
    seed: Option<u64>,
) -> Result<()> {
    let (documents, blobs) = build_stores(&cfg);
    let participant = prompt::collect_participant(name, email, skip_demographics)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let picks =
        selection::select_for_session(documents.as_ref(), blobs.as_ref(), &cfg.selection, &mut rng)
            .await?;
    if picks.is_empty() {
        println!("The survey is completely answered. Thank you for your interest!");
        return Ok(());
    }
    let groups = materialize::materialize(blobs.as_ref(), &picks).await?;
    if groups.is_empty() {
        println!("The survey is completely answered. Thank you for your interest!");
        return Ok(());
    }

    let mut session = SurveySession::new(&groups, participant, Utc::now());
    println!(
        "\n{} face images to rate across {} classroom moments.",
        session.len(),
        groups.len()
    );
    println!("Rate each face 1 (no engagement) to 5 (total engagement), or u if unclear.\n");

    while session.phase() == Phase::Collecting {
        let Some(entry) = session.current() else { break };
        println!("Image {} of {}", session.index() + 1, session.len());
        println!("  context: {}", entry.context.url);
        println!("  face:    {}", entry.image.url);
        if let Some(answer) = session.current_answer() {
            println!("  current answer: {} ({})", answer, answer.label());
        }
        match prompt::read_action()? {
            prompt::Action::Rate(rating) => {
                session.answer_current(rating)?;
                session.advance()?;
            }
            prompt::Action::Back => {
                if session.back().is_err() {
                    println!("Already at the first question.");
                }
            }
            prompt::Action::Quit => {
                println!("Session abandoned; nothing was saved.");
                return Ok(());
            }
        }
    }

    while session.phase() != Phase::Completed {
        match session.submit(documents.as_ref(), Utc::now()).await {
            Ok(()) => {
                println!("Answers successfully submitted. Thank you for participating!");
            }
            Err(e) => {
                eprintln!("Error submitting survey: {}", e);
                if !prompt::confirm("Retry submission?")? {
                    println!("Your answers were not saved.");
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

async fn run_status(cfg: AppConfig, json: bool) -> Result<()> {
    let (documents, blobs) = build_stores(&cfg);
    let (usage, catalog) = tokio::try_join!(
        UsageIndex::load(documents.as_ref()),
        catalog::load_catalog(blobs.as_ref(), &cfg.selection.excluded_datasets)
    )?;
    let candidates = selection::eligible(&catalog, &usage);

    if json {
        let rows: Vec<serde_json::Value> = candidates
            .iter()
            .map(|candidate| {
                serde_json::json!({
                    "dataset": candidate.name,
                    "available_folders": candidate.available.len(),
                    "responses": candidate.response_count,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        if candidates.is_empty() {
            println!("No unused folders remain; the survey is fully answered.");
            return Ok(());
        }
        println!("{} datasets with unused folders (least answered first):", candidates.len());
        for candidate in &candidates {
            println!(
                "  {}: {} folders available, {} responses",
                candidate.name,
                candidate.available.len(),
                candidate.response_count
            );
        }
    }
    Ok(())
}

async fn run_export(
    cfg: AppConfig,
    format: &str,
    out: Option<PathBuf>,
    password: Option<String>,
) -> Result<()> {
    let Some(expected) = cfg
        .admin
        .password
        .clone()
        .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
    else {
        bail!("no admin password configured");
    };
    let given = match password {
        Some(password) => password,
        None => read_password()?,
    };
    if !admin::verify_password(&given, &expected) {
        bail!("invalid password");
    }

    let (documents, _) = build_stores(&cfg);
    let data = admin::load(documents.as_ref()).await?;
    let csv = match format {
        "dataset" => export::dataset_csv(&data.evaluations),
        "sessions" => export::sessions_csv(&data.sessions),
        other => bail!("unknown export format: {}", other),
    };

    match out {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            println!("wrote {}", path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

/// Plain-stdin password prompt; the terminal echo is not suppressed.
fn read_password() -> Result<String> {
    use std::io::{self, BufRead, Write};
    print!("Admin password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
