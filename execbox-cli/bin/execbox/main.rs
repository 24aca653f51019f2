mod handlers;

use clap::{CommandFactory, Parser};
use execbox_cli::{AnsiStyles, ExecboxArgs, ExecboxCliResult, ExecboxSubcommand};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExecboxCliResult<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let args = ExecboxArgs::parse();
    handlers::init_tracing(&args);

    if args.version {
        println!("{}", format!("v{}", env!("CARGO_PKG_VERSION")).literal());
        return Ok(());
    }

    match args.subcommand {
        Some(ExecboxSubcommand::Serve {
            key,
            host,
            port,
            dev_mode,
            limits,
            max_code,
            max_concurrent,
            allowed_origins,
            languages,
            no_pull,
        }) => {
            handlers::serve_subcommand(
                key,
                host,
                port,
                dev_mode,
                limits,
                max_code,
                max_concurrent,
                allowed_origins,
                languages,
                no_pull,
            )
            .await?;
        }
        Some(ExecboxSubcommand::Run {
            language,
            file,
            code,
            limits,
            languages,
            no_pull,
        }) => {
            handlers::run_subcommand(language, file, code, limits, languages, no_pull).await?;
        }
        Some(ExecboxSubcommand::Languages { languages }) => {
            handlers::languages_subcommand(languages)?;
        }
        Some(ExecboxSubcommand::Pull { names, languages }) => {
            handlers::pull_subcommand(names, languages).await?;
        }
        Some(ExecboxSubcommand::Prune) => {
            handlers::prune_subcommand().await?;
        }
        Some(ExecboxSubcommand::Keygen {
            key,
            subject,
            expire,
        }) => {
            handlers::keygen_subcommand(key, subject, expire)?;
        }
        None => {
            ExecboxArgs::command().print_help()?;
        }
    }

    Ok(())
}
