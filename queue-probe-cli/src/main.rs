use clap::{Parser, Subcommand};
use queue_probe::{
    CloudWatchPublisher, LogPublisher, MetricsPublisher, ProbeConfigBuilder, ProbeError,
    QueueProbe, RedisQueueStore,
};

#[derive(Parser, Debug)]
#[command(name = "queue-probe", version)]
#[command(about = "Publish Redis work-queue lengths as CloudWatch metrics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one probe-and-report cycle (default)
    Run {
        /// Log the metric batch instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Trigger payload, passed through verbatim and otherwise ignored
        #[arg(long)]
        event: Option<String>,
    },
    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();

    let outcome = match cli.command.unwrap_or(Commands::Run {
        dry_run: false,
        event: None,
    }) {
        Commands::Run { dry_run, event } => run(dry_run, trigger_event(event)).await,
        Commands::CheckConfig => check_config(),
    };

    if let Err(e) = outcome {
        tracing::error!(kind = e.kind(), error = %e, "Invocation failed");
        std::process::exit(1);
    }
}

/// The trigger payload is never interpreted, so it is kept as an opaque string.
fn trigger_event(raw: Option<String>) -> serde_json::Value {
    raw.map_or(serde_json::Value::Null, serde_json::Value::String)
}

async fn run(dry_run: bool, event: serde_json::Value) -> Result<(), ProbeError> {
    // Validate before building any client
    let config = ProbeConfigBuilder::from_env()?.build()?;

    let publisher: Box<dyn MetricsPublisher> = if dry_run {
        Box::new(LogPublisher::new())
    } else {
        Box::new(CloudWatchPublisher::from_env().await)
    };

    let probe = QueueProbe::new(config, RedisQueueStore::new(), publisher);
    let result = probe.invoke(&event).await?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn check_config() -> Result<(), ProbeError> {
    let config = ProbeConfigBuilder::from_env()?.build()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_event_is_not_parsed() {
        assert_eq!(
            trigger_event(Some("not-json".to_string())),
            serde_json::Value::String("not-json".to_string())
        );
        assert_eq!(
            trigger_event(Some(r#"{"source":"aws.events"}"#.to_string())),
            serde_json::Value::String(r#"{"source":"aws.events"}"#.to_string())
        );
        assert_eq!(trigger_event(None), serde_json::Value::Null);
    }

    #[test]
    fn test_run_accepts_arbitrary_event_text() {
        let cli = Cli::try_parse_from(["queue-probe", "run", "--event", "{not json"]).unwrap();
        match cli.command {
            Some(Commands::Run { event, dry_run }) => {
                assert!(!dry_run);
                assert_eq!(event.as_deref(), Some("{not json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
