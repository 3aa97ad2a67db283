//! Clarity CLI - A kanban task board.

use clap::Parser;
use clarity::cli::{CategoryCommands, Cli, Commands, ServeArgs};
use clarity::client::HttpClient;
use clarity::commands::{self, Output};
use clarity::config::{self, ConfigOverrides, DEFAULT_LOG_LEVEL, ResolvedConfig};
use clarity::drag::DropTarget;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let result = run(cli);

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), clarity::Error> {
    let human = cli.human_readable;

    let mut overrides = ConfigOverrides::new();
    overrides.server_url = cli.server_url.clone();
    if let Commands::Serve(ServeArgs {
        host,
        port,
        data_dir,
    }) = &cli.command
    {
        overrides.host = host.clone();
        overrides.port = *port;
        overrides.data_dir = data_dir.clone();
    }

    let config_path = config::config_path()?;
    let resolved = config::load_config(&config_path, &overrides)?;
    init_tracing(&resolved.log_level.value, human);

    if let Commands::Config = cli.command {
        output(&commands::config_show(&config_path, &resolved), human);
        return Ok(());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| clarity::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(run_async(cli.command, &resolved, human))
}

async fn run_async(
    command: Commands,
    resolved: &ResolvedConfig,
    human: bool,
) -> Result<(), clarity::Error> {
    if let Commands::Serve(_) = command {
        return clarity::server::start_server(
            &resolved.db_path(),
            &resolved.host.value,
            resolved.port.value,
        )
        .await;
    }

    let api = HttpClient::new(resolved.server_url.value.as_str())?;

    match command {
        Commands::Show => output(&commands::show(api).await?, human),
        Commands::Add { content, category } => output(
            &commands::add(api, &content, category.as_deref()).await?,
            human,
        ),
        Commands::Done { id } => output(&commands::set_completed(api, &id, true).await?, human),
        Commands::Undone { id } => {
            output(&commands::set_completed(api, &id, false).await?, human)
        }
        Commands::Rm { id } => output(&commands::remove(api, &id).await?, human),
        Commands::Mv { id, target } => {
            let target = match (target.over_task, target.over_category) {
                (Some(task), _) => DropTarget::Task(task),
                (None, Some(category)) => DropTarget::Category(category),
                (None, None) => {
                    return Err(clarity::Error::InvalidInput(
                        "one of --over-task or --over-category is required".to_string(),
                    ));
                }
            };
            output(&commands::move_task(api, &id, target).await?, human)
        }
        Commands::Category { command } => match command {
            CategoryCommands::Add { name } => {
                output(&commands::category_add(api, &name).await?, human)
            }
        },
        Commands::Serve(_) | Commands::Config => {}
    }

    Ok(())
}

/// Install the global subscriber with the resolved filter (`RUST_LOG`,
/// then `log-level`). An unparsable filter falls back to the default level.
///
/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(level: &str, human: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // a second init (e.g. in-process tests) is harmless
    let _ = if human {
        builder.compact().try_init()
    } else {
        builder.json().try_init()
    };
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
