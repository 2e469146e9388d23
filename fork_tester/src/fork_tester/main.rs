//!
//! The fork tester executable.
//!

pub(crate) mod arguments;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

use self::arguments::Arguments;

/// The success exit code.
const EXIT_CODE_SUCCESS: i32 = 0;

/// The failure exit code.
const EXIT_CODE_FAILURE: i32 = 1;

///
/// The application entry point.
///
fn main() {
    let exit_code = match main_inner(Arguments::new()) {
        Ok(()) => EXIT_CODE_SUCCESS,
        Err(error) => {
            eprintln!("{error:?}");
            EXIT_CODE_FAILURE
        }
    };
    std::process::exit(exit_code);
}

///
/// The entry point wrapper used for proper error handling.
///
fn main_inner(arguments: Arguments) -> anyhow::Result<()> {
    init_tracing(&arguments)?;

    let settings = match arguments.config {
        Some(ref path) => fork_tester::Settings::from_file(path)?,
        None => fork_tester::Settings::default(),
    };
    let parameters = settings.merge(arguments.settings()).resolve()?;
    tracing::info!(
        endpoint = %parameters.endpoint,
        chain_id = parameters.chain.chain_id,
        pre_fork_block = parameters.chain.pre_fork_block,
        post_fork_block = parameters.chain.post_fork_block,
        sender = ?parameters.sender.address(),
        "Parameters"
    );

    let client = Arc::new(fork_tester::HttpClient::new(parameters.endpoint.as_str())?);
    let summary = fork_tester::Summary::new(arguments.verbosity, arguments.quiet).wrap();
    let filters = fork_tester::Filters::new(arguments.paths.clone(), arguments.groups.clone());
    let tester = fork_tester::ForkTester::new(summary.clone(), filters, parameters);

    let phases = arguments.phases();
    let run_time_start = Instant::now();
    println!(
        "     {} {} phase(s)",
        "Running".bright_green().bold(),
        phases.len(),
    );

    let keep_going = arguments.keep_going;
    let report = tester.run(client, phases.as_slice(), |report| {
        if let Some(error) = fail_fast_error(report, keep_going) {
            eprintln!("{} {error}", "Error".bright_red().bold());
            std::process::exit(EXIT_CODE_FAILURE);
        }
    })?;
    drop(tester);

    let summary = fork_tester::Summary::unwrap_arc(summary);
    print!("{summary}");
    println!(
        "    {} running tests in {}m{:02}s",
        "Finished".bright_green().bold(),
        run_time_start.elapsed().as_secs() / 60,
        run_time_start.elapsed().as_secs() % 60,
    );

    if !report.is_successful() {
        let failures = report
            .failures()
            .filter_map(|report| fail_fast_error(report, false))
            .collect::<Vec<String>>();
        anyhow::bail!("Failed phases:\n{}", failures.join("\n"));
    }

    println!("{}", "ALL TESTS PASSED!".bright_green().bold());
    Ok(())
}

///
/// The error to exit with as soon as the phase has finished, if any.
///
fn fail_fast_error(report: &fork_tester::PhaseReport, keep_going: bool) -> Option<String> {
    if keep_going || report.is_successful() {
        return None;
    }

    Some(match report.error {
        Some(ref error) => format!("{}: {error}", report.phase),
        None => report.phase.to_string(),
    })
}

///
/// Installs the global log subscriber.
///
fn init_tracing(arguments: &Arguments) -> anyhow::Result<()> {
    let level = if arguments.quiet {
        "error"
    } else if arguments.verbosity {
        "debug"
    } else {
        "info"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Directive::from_str(level)?)
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
