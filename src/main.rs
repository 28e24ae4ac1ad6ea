//! Casetrack CLI - Track disciplinary cases through their six steps

use std::io::Write;

use casetrack::cli::commands::{case, categories, evidence, list, open, show, step};
use casetrack::cli::{open_machine, stdin_confirm, Cli, Commands};
use casetrack::errors::to_exit_code;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_recoverable() {
                eprintln!("Fix the input or return to the step named above, then run the command again.");
            }
            std::process::exit(to_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> casetrack::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        println!("Use --help for usage information");
        return Ok(());
    };

    let machine = open_machine(&cli)?;
    let confirm = stdin_confirm(cli.yes);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::List {
            employee,
            step,
            search,
            json,
            csv,
        } => {
            list::run(
                &machine,
                list::scope(*employee),
                *step,
                search,
                list::ListFormat::from_flags(*json, *csv),
                &mut out,
            )
            .await?
        }
        Commands::Counts { employee, json } => {
            list::counts(&machine, list::scope(*employee), *json, &mut out).await?
        }
        Commands::Show { case_id, json } => show::run(&machine, *case_id, *json, &mut out).await?,
        Commands::Open { case_id, step } => {
            open::run(&machine, *case_id, *step, confirm, &mut out).await?
        }
        Commands::Create { draft } => case::create(&machine, draft.clone().into(), &mut out).await?,
        Commands::Edit { case_id, draft } => {
            case::edit(&machine, *case_id, draft.clone().into(), &mut out).await?
        }
        Commands::Save {
            case_id,
            step: target,
            fields,
        } => step::save(&machine, *case_id, *target, fields, &mut out).await?,
        Commands::Advance {
            case_id,
            step: target,
        } => step::advance(&machine, *case_id, *target, confirm, &mut out).await?,
        Commands::Close {
            case_id,
            step: target,
            justification,
        } => {
            step::close(&machine, *case_id, *target, justification, confirm, &mut out).await?
        }
        Commands::Evidence {
            case_id,
            file,
            description,
        } => {
            evidence::attach(&machine, *case_id, file, description.as_deref(), &mut out).await?
        }
        Commands::EvidenceDelete {
            case_id,
            evidence_id,
        } => evidence::delete(&machine, *case_id, *evidence_id, &mut out).await?,
        Commands::Categories { json } => categories::run(&machine, *json, &mut out).await?,
    }

    out.flush()?;
    Ok(())
}
