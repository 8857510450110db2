use clap::{Parser, Subcommand};
use nestedset_sink::config::parse_duration_to_secs;
use nestedset_sink::{new_postgresql_client, SinkConfig, SyncOutcome, Synchronizer};

#[derive(Parser)]
#[command(name = "nestedset-sink")]
#[command(about = "Synchronizes nested-set change logs into a live PostgreSQL table")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run synchronization cycles against the destination database
    Run {
        /// PostgreSQL connection string
        #[arg(long, env = "NESTEDSET_SINK_CONNECTION_STRING")]
        connection_string: String,

        /// Path to the sink configuration YAML file
        #[arg(long)]
        config: std::path::PathBuf,

        /// Pause between cycles ("300", "30s", "5m", "1h")
        #[arg(long, default_value = "10s")]
        interval: String,

        /// Stop after this long; runs until interrupted when unset
        #[arg(long)]
        timeout: Option<String>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            connection_string,
            config,
            interval,
            timeout,
            once,
        } => {
            let sink_config = SinkConfig::from_yaml_file(&config)?;
            let interval_secs = parse_duration_to_secs(&interval)?.max(0) as u64;
            let deadline = timeout
                .as_deref()
                .map(parse_duration_to_secs)
                .transpose()?
                .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs));

            tracing::info!(
                "Starting nested set synchronization of the table {} from the log table {}",
                sink_config.table_name,
                sink_config.log_table_name
            );

            let mut client = new_postgresql_client(&connection_string).await?;
            let synchronizer = Synchronizer::new(sink_config);

            loop {
                match synchronizer.synchronize(&mut client).await? {
                    SyncOutcome::Applied {
                        inserted,
                        updated,
                        deleted,
                        offset,
                    } => {
                        tracing::info!(
                            "Cycle applied {inserted} inserts, {updated} updates, {deleted} deletes; offset now {offset}"
                        );
                    }
                    SyncOutcome::NoPending => {
                        tracing::debug!("No outstanding log entries");
                    }
                    SyncOutcome::SkippedInvalidCoordinates => {
                        tracing::warn!("Cycle skipped: invalid nested set coordinates");
                    }
                    SyncOutcome::SkippedInvalidForest => {
                        tracing::warn!("Cycle skipped: projected structure is not a nested set");
                    }
                }

                if once {
                    break;
                }
                if let Some(deadline) = deadline {
                    if chrono::Utc::now() >= deadline {
                        tracing::info!("Reached deadline: {deadline}, stopping");
                        break;
                    }
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval_secs)).await;
            }

            tracing::info!("Synchronization stopped");
        }
    }

    Ok(())
}
