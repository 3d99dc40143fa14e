//! taskstream - task intelligence pipeline and offline queue inspector.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use taskstream::model::{Agenda, IdeaAnalysis, Priority, RoutedTask, TaskCandidate};
use taskstream::pipeline::classify;
use taskstream::queue::{MutationPayload, QueuePersistence};
use taskstream::EngineConfig;

#[derive(Parser)]
#[command(name = "taskstream")]
#[command(version)]
#[command(about = "Classify captured tasks and inspect offline mutation queues", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding .taskstream/config.toml
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run candidates through context mapping, scoring and routing
    Classify {
        /// JSON file with an array of task candidates
        candidates: PathBuf,

        /// JSON file with the idea analysis for the same capture
        #[arg(short, long)]
        analysis: Option<PathBuf>,

        /// Print the classified batch as JSON
        #[arg(long)]
        json: bool,
    },

    /// List mutations waiting in a user's offline queue
    Queue {
        /// User whose queue to read
        user_id: String,

        /// Queue directory (defaults to config, then the platform data dir)
        #[arg(long, env = "TASKSTREAM_QUEUE_DIR")]
        queue_dir: Option<PathBuf>,

        /// Print pending mutations as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "taskstream=debug,info"
    } else {
        "taskstream=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify {
            candidates,
            analysis,
            json,
        } => run_classify(&candidates, analysis.as_deref(), json),
        Commands::Queue {
            user_id,
            queue_dir,
            json,
        } => run_queue(&cli.project, &user_id, queue_dir, json),
    }
}

fn run_classify(candidates: &Path, analysis: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(candidates)
        .with_context(|| format!("Failed to read {}", candidates.display()))?;
    let candidates: Vec<TaskCandidate> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid candidate list in {}", candidates.display()))?;

    let analysis = match analysis {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<IdeaAnalysis>(&content)
                .with_context(|| format!("Invalid idea analysis in {}", path.display()))?
        }
        None => IdeaAnalysis::default(),
    };

    let batch = classify(&candidates, &analysis);

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!(
        "{} {} task(s), time sensitivity {}",
        "Classified:".cyan().bold(),
        batch.tasks.len(),
        batch.context.time_sensitivity
    );
    if !batch.context.inferred_projects.is_empty() {
        println!("   Projects: {}", batch.context.inferred_projects.join(", "));
    }
    if !batch.context.related_people.is_empty() {
        println!("   People: {}", batch.context.related_people.join(", "));
    }
    println!();

    for task in &batch.tasks {
        print_routed(task);
    }
    Ok(())
}

fn print_routed(task: &RoutedTask) {
    let priority = match task.priority() {
        Priority::Must => task.priority().to_string().red().bold(),
        Priority::Should => task.priority().to_string().yellow(),
        Priority::Could => task.priority().to_string().normal(),
    };
    let agenda = match task.agenda {
        Agenda::Today => task.agenda.to_string().green().bold(),
        _ => task.agenda.to_string().normal(),
    };
    println!(
        "   {:<8} {:<10} {:<12} {}",
        priority,
        agenda,
        task.task_type().to_string().dimmed(),
        task.title()
    );
}

fn run_queue(
    project: &Path,
    user_id: &str,
    queue_dir: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let queue_dir = match queue_dir {
        Some(dir) => dir,
        None => {
            let config = EngineConfig::load(project)?;
            config
                .store
                .queue_dir
                .or_else(taskstream::StoreConfig::default_queue_dir)
                .context("No queue directory configured and no platform data directory")?
        }
    };

    let persistence = QueuePersistence::new(&queue_dir, user_id);
    let mutations: Vec<_> = persistence
        .load()?
        .map(|file| file.mutations.into_iter().collect())
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&mutations)?);
        return Ok(());
    }

    if mutations.is_empty() {
        println!("{} No pending mutations for {}", "OK".green().bold(), user_id);
        return Ok(());
    }

    println!(
        "{} {} pending mutation(s) for {}",
        "Queue:".cyan().bold(),
        mutations.len(),
        user_id
    );
    for (i, mutation) in mutations.iter().enumerate() {
        let detail = match &mutation.payload {
            MutationPayload::Create { input } => input.title.clone(),
            MutationPayload::Update { patch } => patch
                .title
                .clone()
                .unwrap_or_else(|| "(fields)".to_string()),
            MutationPayload::Delete => String::new(),
        };
        println!(
            "   {:>3}. {:<6} {:<40} attempts={} {}",
            i + 1,
            mutation.kind().to_string().bold(),
            mutation.entity_ref.as_str(),
            mutation.attempts,
            detail.dimmed()
        );
    }
    Ok(())
}
