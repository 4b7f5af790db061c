use clap::Parser;
use vsac_cli::config::cli::{Cli, Command};
use vsac_cli::config::store::load_id_list;
use vsac_cli::utils::{error::ErrorSeverity, logger, validation::Validate};
use vsac_cli::{Endpoints, FileCredentialStore, OutputTarget, VsacEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose, cli.quiet);

    tracing::info!("Starting vsac-cli");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let endpoints = Endpoints::default();
    if let Err(e) = endpoints.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let store = FileCredentialStore::new(cli.token_file.clone());
    let engine = VsacEngine::new(endpoints, store);

    match run(&cli, &engine).await {
        Ok(()) => {
            tracing::info!("✅ Done");
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(cli: &Cli, engine: &VsacEngine<FileCredentialStore>) -> vsac_cli::Result<()> {
    match &cli.command {
        Command::Fetch { ids } => {
            let ids = collect_ids(ids, cli)?;
            if ids.is_empty() {
                tracing::warn!("no value set ids given");
                return Ok(());
            }
            let outputs = engine.fetch_and_render(&ids, &cli.format).await?;
            for (id, output) in ids.iter().zip(&outputs) {
                if cli.verbose {
                    println!("{id}");
                }
                println!("{output}");
            }
            Ok(())
        }
        Command::Convert { ids } => {
            let ids = collect_ids(ids, cli)?;
            if ids.is_empty() {
                tracing::warn!("no value set ids given");
                return Ok(());
            }
            let target = OutputTarget {
                file: cli.output.clone(),
                dir: cli.output_dir.clone(),
            };
            let written = engine.convert_and_write(&ids, &cli.format, &target).await?;
            for path in written {
                tracing::info!("📁 Wrote {}", path.display());
            }
            Ok(())
        }
        Command::Init => engine.init_credential().await,
        Command::Reset => engine.reset_credential().await,
    }
}

fn collect_ids(ids: &[String], cli: &Cli) -> vsac_cli::Result<Vec<String>> {
    let mut all = ids.to_vec();
    if let Some(input) = &cli.input {
        all.extend(load_id_list(input)?);
    }
    Ok(all)
}
