//!
//! The phase scheduler.
//!

use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;

use crate::phase::runner::PhaseReport;
use crate::phase::runner::PhaseRunner;
use crate::phase::Phase;

///
/// The outcome of a run.
///
#[derive(Debug)]
pub struct RunReport {
    /// The phase reports in scheduling order.
    pub reports: Vec<PhaseReport>,
}

impl RunReport {
    ///
    /// Whether every phase passed.
    ///
    pub fn is_successful(&self) -> bool {
        self.reports.iter().all(PhaseReport::is_successful)
    }

    ///
    /// The reports of the failed phases.
    ///
    pub fn failures(&self) -> impl Iterator<Item = &PhaseReport> {
        self.reports.iter().filter(|report| !report.is_successful())
    }
}

///
/// Runs the phases concurrently, one worker thread each.
///
pub struct Scheduler {
    /// The phase workers.
    pool: rayon::ThreadPool,
}

impl Scheduler {
    ///
    /// A shortcut constructor.
    ///
    pub fn new() -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(Phase::ALL.len())
            .thread_name(|index| format!("phase-{index}"))
            .build()
            .map_err(|error| anyhow::anyhow!("Phase thread pool initialization: {error}"))?;
        Ok(Self { pool })
    }

    ///
    /// Runs the phases to completion and joins them.
    ///
    /// `on_phase_finished` is called from the phase thread as soon as the phase
    /// ends, so the caller can react to a failure before the other phase does.
    ///
    pub fn run<F>(&self, runners: Vec<PhaseRunner>, on_phase_finished: F) -> RunReport
    where
        F: Fn(&PhaseReport) + Sync,
    {
        tracing::info!(
            phases = ?runners.iter().map(PhaseRunner::phase).collect::<Vec<Phase>>(),
            "Starting phases"
        );

        let reports = self.pool.install(|| {
            runners
                .into_par_iter()
                .map(|runner| {
                    let report = runner.run();
                    on_phase_finished(&report);
                    report
                })
                .collect::<Vec<PhaseReport>>()
        });

        RunReport { reports }
    }
}
