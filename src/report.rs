//! Run statistics.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Every process reported convergence in the same step.
    Converged,
    /// The step limit was reached first.
    StepLimit,
}

/// Outcome of one solver run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub size_x: usize,
    pub size_y: usize,
    /// Kernel sweeps executed.
    pub steps: usize,
    pub termination: Termination,
    pub elapsed: Duration,
    pub processes: usize,
    pub threads: usize,
}

impl RunReport {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Estimated GFLOP/s, counting six operations per cell per step.
    pub fn gflops(&self) -> f64 {
        let usecs = self.elapsed.as_secs_f64() * 1e6;
        if usecs == 0.0 {
            return 0.0;
        }
        (6.0 * self.size_x as f64 * self.size_y as f64 * self.steps as f64) / (usecs * 1000.0)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# steps = {}", self.steps)?;
        writeln!(f, "# time = {} usecs.", self.elapsed.as_secs_f64() * 1e6)?;
        write!(f, "# gflops = {}", self.gflops())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gflops_counts_six_ops_per_cell() {
        let r = RunReport {
            size_x: 10,
            size_y: 10,
            steps: 1000,
            termination: Termination::Converged,
            elapsed: Duration::from_micros(600),
            processes: 1,
            threads: 1,
        };
        // 6 * 100 * 1000 / (600 * 1000)
        assert!((r.gflops() - 1.0).abs() < 1e-12);
        assert!(r.to_string().starts_with("# steps = 1000\n# time = 600 usecs."));
    }
}
