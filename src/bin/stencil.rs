//! `stencil` command-line driver.
//!
//! ```sh
//! stencil 64 --ranks 4 --threads 2
//! stencil 10 -t --variant shared
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};

use heat_stencil::config::{DEFAULT_SIZE, StencilConfig, clamp_size};
use heat_stencil::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "2D heat diffusion on a block-decomposed grid")]
#[command(version)]
struct Cli {
    /// Grid edge length, border included. Values below 2 fall back to 10.
    #[arg(allow_negative_numbers = true)]
    size: Option<i64>,

    /// Rerun on the sequential reference and compare cell by cell.
    #[arg(short, long)]
    test: bool,

    #[arg(long, value_enum, default_value_t = Variant::Hybrid)]
    variant: Variant,

    /// Simulated processes for the hybrid variant.
    #[arg(long, default_value_t = 1)]
    ranks: usize,

    /// Worker threads per process (default: available cores shared
    /// between ranks).
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    max_steps: Option<usize>,

    /// Run one rank per MPI process instead of simulated ranks.
    #[cfg(feature = "mpi-support")]
    #[arg(long)]
    mpi: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Single-threaded reference.
    Seq,
    /// One process, many threads.
    Shared,
    /// Many processes, many threads each.
    Hybrid,
}

impl Cli {
    fn config(&self) -> StencilConfig {
        let size = match self.size {
            Some(n) => clamp_size(usize::try_from(n).unwrap_or(0)),
            None => DEFAULT_SIZE,
        };
        let mut config = StencilConfig {
            size,
            ..StencilConfig::default()
        };
        let threads = self
            .threads
            .unwrap_or_else(|| config.threads / self.ranks.max(1));
        config = config.with_threads(threads);
        if let Some(max_steps) = self.max_steps {
            config = config.with_max_steps(max_steps);
        }
        config
    }
}

fn print_header(config: &StencilConfig) {
    println!("# init:");
    println!("# size = {}", config.size);
}

fn print_check(field: &GlobalField<f32>, params: &StencilParams<f32>) -> anyhow::Result<()> {
    println!("Test mode");
    print!("{field}");
    let report = self_check(field, params)?;
    print!("{report}");
    Ok(())
}

fn run_local(cli: &Cli, config: &StencilConfig, params: &StencilParams<f32>) -> anyhow::Result<()> {
    print_header(config);
    let field = GlobalField::ramp(config.size, config.size)?;
    let (field, report) = match cli.variant {
        Variant::Seq => {
            let sol = solve_sequential(field, params)?;
            (sol.field, sol.report)
        }
        Variant::Shared => {
            let sol = solve_shared(field, params, config.threads)?;
            (sol.field, sol.report)
        }
        Variant::Hybrid => {
            let out = solve_hybrid_local(field, params, cli.ranks, config.threads)
                .with_context(|| format!("hybrid run on {} ranks failed", cli.ranks))?;
            let field = out.field.context("coordinator returned no field")?;
            (field, out.report)
        }
    };
    println!("{report}");
    if cli.test {
        print_check(&field, params)?;
    }
    Ok(())
}

#[cfg(feature = "mpi-support")]
fn run_mpi(cli: &Cli, config: &StencilConfig, params: &StencilParams<f32>) -> anyhow::Result<()> {
    use heat_stencil::algs::communicator::COORDINATOR;

    let comm = MpiComm::new()?;
    let coordinator = comm.rank() == COORDINATOR;
    if coordinator {
        print_header(config);
    }
    let solver = HybridSolver::new(&comm, config.size, config.size, *params, config.threads)?;
    let global = if coordinator {
        Some(GlobalField::ramp(config.size, config.size)?)
    } else {
        None
    };
    let outcome = solver.run(global)?;
    if let Some(field) = outcome.field {
        println!("{}", outcome.report);
        if cli.test {
            print_check(&field, params)?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.config();
    let params = config.params::<f32>()?;
    log::debug!("{config:?}");

    #[cfg(feature = "mpi-support")]
    if cli.mpi {
        return run_mpi(&cli, &config, &params);
    }
    run_local(&cli, &config, &params)
}
