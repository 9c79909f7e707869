// Run all jobs on a rayon pool

use rayon::prelude::*;

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// Run multiple jobs in parallel, collecting results in input order.
/// One job failure does NOT prevent other jobs from running.
///
/// `workers == 0` uses rayon's default thread count.
pub fn run_all_jobs(
    jobs: &[JobConfig],
    workers: usize,
) -> Vec<crate::error::Result<JobResult>> {
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "thread pool unavailable, running jobs sequentially");
            return jobs.iter().map(run_job).collect();
        }
    };

    pool.install(|| jobs.par_iter().map(run_job).collect())
}
