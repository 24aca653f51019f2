use std::{collections::BTreeSet, path::Path, path::PathBuf, sync::Arc, time::Duration};

use execbox_cli::{AnsiStyles, ExecboxArgs, ExecboxCliError, ExecboxCliResult, LanguageArgs, LimitArgs};
use execbox_core::{
    config::ResourceLimits,
    registry::LanguageRegistry,
    runtime::DockerRuntime,
    sandbox::{ExecutionRequest, Orchestrator},
    ExecboxError,
};
use execbox_server::{auth, route, state::AppState, Config};
use execbox_utils::{CHECKMARK, CROSS, DEFAULT_PIDS_LIMIT};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const MIB: u64 = 1024 * 1024;

const DEFAULT_LOG_FILTER: &str = "execbox=info";

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

/// Installs the log subscriber. Level flags take precedence over `RUST_LOG`.
pub fn init_tracing(args: &ExecboxArgs) {
    let level = if args.trace {
        Some("trace")
    } else if args.debug {
        Some("debug")
    } else if args.info {
        Some("info")
    } else if args.warn {
        Some("warn")
    } else if args.error {
        Some("error")
    } else {
        None
    };

    let filter = match level {
        Some(level) => EnvFilter::new(format!("execbox={}", level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
pub async fn serve_subcommand(
    key: Option<String>,
    host: String,
    port: u16,
    dev_mode: bool,
    limits: LimitArgs,
    max_code: usize,
    max_concurrent: usize,
    allowed_origins: Vec<String>,
    languages: LanguageArgs,
    no_pull: bool,
) -> ExecboxCliResult<()> {
    if dev_mode {
        tracing::info!("Development mode: {}", dev_mode);
        println!(
            "{} Running in {} mode",
            &*CHECKMARK,
            console::style("development").yellow()
        );
    }

    let config = Config::new(key, &host, port, dev_mode)?
        .with_limits(resource_limits(&limits)?)
        .with_max_code_bytes(max_code)?
        .with_max_concurrent(max_concurrent)?
        .with_allowed_origins(allowed_origins)
        .with_languages_file(languages.file)
        .with_pull_missing(!no_pull);
    let config = Arc::new(config);

    let registry = load_registry(config.get_languages_file().as_deref())?;
    tracing::info!("loaded {} language profiles", registry.len());

    let runtime = DockerRuntime::connect(*config.get_pull_missing())?;
    runtime.ping().await?;

    if no_pull {
        report_missing_images(&runtime, &registry).await?;
    }

    // Units orphaned by a previous process still hold memory
    match runtime.prune().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!("removed {} orphaned execution units", removed),
        Err(e) => tracing::warn!("failed to prune orphaned execution units: {}", e),
    }

    let state = AppState::new(
        config.clone(),
        Arc::new(registry),
        Orchestrator::new(Arc::new(runtime)),
    );
    let app = route::create_router(state);

    tracing::info!("Starting server on {}", config.get_addr());
    println!(
        "{} Server listening on {}",
        &*CHECKMARK,
        console::style(config.get_addr()).yellow()
    );

    let listener = tokio::net::TcpListener::bind(*config.get_addr()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub async fn run_subcommand(
    language: String,
    file: Option<PathBuf>,
    code: Option<String>,
    limits: LimitArgs,
    languages: LanguageArgs,
    no_pull: bool,
) -> ExecboxCliResult<()> {
    let source_code = match (code, file) {
        (Some(code), _) => code,
        (None, Some(file)) => tokio::fs::read_to_string(&file).await?,
        (None, None) => {
            let mut code = String::new();
            tokio::io::stdin().read_to_string(&mut code).await?;
            code
        }
    };

    if source_code.trim().is_empty() {
        return Err(ExecboxCliError::InvalidArgument(
            "no code to run".to_string(),
        ));
    }

    let registry = load_registry(languages.file.as_deref())?;
    let limits = resource_limits(&limits)?;
    let orchestrator = Orchestrator::new(Arc::new(DockerRuntime::connect(!no_pull)?));

    let request = ExecutionRequest::new(language, source_code);
    let result = orchestrator
        .execute_request(&registry, &request, &limits)
        .await?;

    if !result.status.is_program_outcome() {
        return Err(ExecboxCliError::ExecutionFailed(result.output));
    }

    if result.output.ends_with('\n') {
        print!("{}", result.output);
    } else {
        println!("{}", result.output);
    }

    tracing::debug!(
        "{} exited with {} after {}ms",
        request.language_id,
        result.exit_code,
        result.duration_ms
    );

    if result.exit_code != 0 {
        std::process::exit(i32::try_from(result.exit_code).unwrap_or(1));
    }

    Ok(())
}

pub fn languages_subcommand(languages: LanguageArgs) -> ExecboxCliResult<()> {
    let registry = load_registry(languages.file.as_deref())?;

    println!("{}", "Languages".header());
    for profile in registry.profiles() {
        let aliases = if profile.get_aliases().is_empty() {
            String::new()
        } else {
            format!("({})", profile.get_aliases().join(", "))
        };

        println!(
            "  {:<12} {:<28} {}",
            profile.get_language_id().as_str().literal(),
            profile.get_image_reference(),
            aliases.as_str().placeholder()
        );
    }

    Ok(())
}

pub async fn pull_subcommand(names: Vec<String>, languages: LanguageArgs) -> ExecboxCliResult<()> {
    let registry = load_registry(languages.file.as_deref())?;

    let images: BTreeSet<String> = if names.is_empty() {
        registry
            .profiles()
            .map(|profile| profile.get_image_reference().clone())
            .collect()
    } else {
        names
            .iter()
            .map(|name| {
                registry
                    .resolve(name)
                    .map(|profile| profile.get_image_reference().clone())
                    .ok_or_else(|| ExecboxError::UnsupportedLanguage(name.clone()))
            })
            .collect::<Result<_, _>>()?
    };

    let runtime = DockerRuntime::connect(true)?;
    let mut failed = 0;
    for image in &images {
        match runtime.pull_image(image).await {
            Ok(()) => println!("{} {}", &*CHECKMARK, image),
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", &*CROSS, image, e);
            }
        }
    }

    if failed > 0 {
        return Err(ExecboxCliError::ExecutionFailed(format!(
            "failed to pull {} of {} images",
            failed,
            images.len()
        )));
    }

    Ok(())
}

pub async fn prune_subcommand() -> ExecboxCliResult<()> {
    let runtime = DockerRuntime::connect(false)?;
    let removed = runtime.prune().await?;
    println!("{} Removed {} execution units", &*CHECKMARK, removed);
    Ok(())
}

pub fn keygen_subcommand(key: String, subject: String, expire: String) -> ExecboxCliResult<()> {
    let expire = parse_expire(&expire)?;
    let token = auth::issue_token(&key, &subject, expire)?;

    println!("{} Token for {}", &*CHECKMARK, subject.as_str().literal());
    println!("{}", token);
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn load_registry(file: Option<&Path>) -> ExecboxCliResult<LanguageRegistry> {
    let registry = match file {
        Some(file) => LanguageRegistry::from_file(file)?,
        None => LanguageRegistry::builtin()?,
    };
    Ok(registry)
}

/// Warns about images that are not present locally. With pulling disabled, requests for their
/// languages will fail with `ImageUnavailable`.
async fn report_missing_images(
    runtime: &DockerRuntime,
    registry: &LanguageRegistry,
) -> ExecboxCliResult<()> {
    let images: BTreeSet<&String> = registry
        .profiles()
        .map(|profile| profile.get_image_reference())
        .collect();

    for image in images {
        if !runtime.has_image(image).await? {
            tracing::warn!("image {} is missing and will not be pulled", image);
            println!(
                "{} Image {} is missing; run {} to fetch it",
                &*CROSS,
                console::style(image).yellow(),
                "execbox pull".literal()
            );
        }
    }

    Ok(())
}

fn resource_limits(args: &LimitArgs) -> ExecboxCliResult<ResourceLimits> {
    let limits = ResourceLimits::new(
        args.memory.saturating_mul(MIB),
        Duration::from_secs(args.timeout),
        DEFAULT_PIDS_LIMIT,
        args.max_output,
    )?;
    Ok(limits)
}

/// Parses a lifetime such as `30m`, `12h` or `7d`. A bare number is read as hours.
fn parse_expire(expire: &str) -> ExecboxCliResult<chrono::Duration> {
    let expire = expire.trim();
    let invalid = || ExecboxCliError::InvalidArgument(format!("invalid token lifetime '{}'", expire));

    let (value, unit) = match expire.char_indices().last() {
        Some((index, unit)) if unit.is_ascii_alphabetic() => (&expire[..index], unit),
        Some(_) => (expire, 'h'),
        None => return Err(invalid()),
    };

    let value: i64 = value.parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }

    match unit {
        's' => Ok(chrono::Duration::seconds(value)),
        'm' => Ok(chrono::Duration::minutes(value)),
        'h' => Ok(chrono::Duration::hours(value)),
        'd' => Ok(chrono::Duration::days(value)),
        _ => Err(invalid()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
