use gridrelax::prelude::*;

use clap::{Parser, Subcommand};
use kdam::BarExt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct RunSettings {
    dimension: usize,
    n_workers: usize,
    backend: BackendChoice,
    /// Multiple of 1e-4
    precision: usize,
    seed: u64,
}

fn run_relaxation(run_settings: &RunSettings) -> Result<(), RelaxError> {
    let grid: Grid<f64> = Grid::random(run_settings.dimension, run_settings.seed)?;
    let settings = RelaxSettings::new(
        run_settings.n_workers,
        run_settings.precision as f64 * 1e-4,
    )?
    .with_backend(run_settings.backend);
    let outcome = relax(grid, &settings)?;
    assert!(outcome.converged);
    Ok(())
}

impl CLIArgs {
    fn create_kdam_bar(
        &self,
        init_fmt_string: impl Into<String>,
        total: usize,
    ) -> Option<kdam::Bar> {
        if self.no_output {
            None
        } else {
            Some(kdam::tqdm!(
                desc = init_fmt_string,
                total = total,
                position = 0
            ))
        }
    }

    fn set_description_and_update(
        progress_bar: &mut Option<kdam::Bar>,
        desc: impl Into<String>,
        update: usize,
    ) {
        if let Some(bar) = progress_bar.as_mut() {
            bar.set_description(desc);
            match bar.update(update) {
                Ok(_) => (),
                Err(e) => println!("Progressbar could not be updated with error: {e}"),
            }
        }
    }

    fn get_storage_base_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.output_directory).join(&self.name)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct BenchmarkResult {
    run_settings: RunSettings,
    /// Wall-clock duration of each sample in nanoseconds
    times: Vec<u128>,
}

impl BenchmarkResult {
    fn get_next_index_value(
        storage_path: &std::path::Path,
    ) -> Result<u32, Box<dyn std::error::Error>> {
        let mut index = 0;
        for globresult in glob::glob(&format!("{}/*.json", storage_path.to_string_lossy()))? {
            let res = globresult?;
            if let Some(file_name) = res.file_stem() {
                let new_index: u32 = file_name.to_string_lossy().parse()?;
                index = new_index.max(index);
            }
        }
        Ok(index + 1)
    }

    fn get_storage_path(
        args: &CLIArgs,
        save_prefix: impl Into<std::path::PathBuf>,
    ) -> std::path::PathBuf {
        args.get_storage_base_path().join(save_prefix.into())
    }

    fn store_to_file(
        &self,
        args: &CLIArgs,
        save_prefix: impl Into<std::path::PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let storage_path = Self::get_storage_path(args, save_prefix);
        std::fs::create_dir_all(&storage_path)?;
        let index = Self::get_next_index_value(&storage_path)?;
        let file_path = storage_path.join(format!("{index:010}.json"));
        let buffer = std::fs::File::create(file_path)?;
        serde_json::to_writer(buffer, self)?;
        Ok(())
    }
}

fn run_bench(
    args: &CLIArgs,
    settings: Vec<RunSettings>,
    formatter: impl Fn(&RunSettings, usize) -> String,
    save_prefix: &str,
) -> Vec<BenchmarkResult> {
    let mut results = vec![];
    let mut progress_bar = args.create_kdam_bar("", settings.len() * args.sample_size);
    for setting in settings.into_iter() {
        let mut times = vec![];
        for n_sample in 0..args.sample_size {
            CLIArgs::set_description_and_update(
                &mut progress_bar,
                formatter(&setting, n_sample),
                1,
            );
            let now = std::time::Instant::now();
            run_relaxation(&setting).unwrap();
            times.push(now.elapsed().as_nanos());
        }
        let result = BenchmarkResult {
            run_settings: setting,
            times,
        };
        if !args.no_save {
            result.store_to_file(args, save_prefix).unwrap();
        }
        results.push(result);
    }
    results
}

fn thread_scaling(args: &CLIArgs, threads: Vec<usize>) -> Vec<BenchmarkResult> {
    let settings: Vec<_> = threads
        .into_iter()
        .map(|n_workers| RunSettings {
            dimension: 256,
            n_workers,
            backend: BackendChoice::Banded,
            precision: 10,
            seed: 1000,
        })
        .collect();
    run_bench(
        args,
        settings,
        |setting: &RunSettings, n_sample: usize| {
            format!("Workers: {} Sample: {}", setting.n_workers, n_sample + 1)
        },
        "thread-scaling",
    )
}

fn grid_size_scaling(
    args: &CLIArgs,
    dimensions: Vec<usize>,
    n_workers: usize,
) -> Vec<BenchmarkResult> {
    let settings: Vec<_> = dimensions
        .into_iter()
        .map(|dimension| RunSettings {
            dimension,
            n_workers,
            backend: BackendChoice::Banded,
            precision: 10,
            seed: 1000,
        })
        .collect();
    run_bench(
        args,
        settings,
        |setting: &RunSettings, n_sample: usize| {
            format!("Dimension: {} Sample: {}", setting.dimension, n_sample + 1)
        },
        "grid-size-scaling",
    )
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Worker-count scaling benchmark
    Threads {
        /// List of worker counts to benchmark
        threads: Vec<usize>,
    },
    /// Grid-size scaling benchmark
    GridSize {
        /// List of grid dimensions to benchmark
        dimensions: Vec<usize>,
        #[arg(short, default_value_t = 1)]
        n_workers: usize,
    },
}

/// Create new relaxation benchmark for worker or grid-size scaling
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CLIArgs {
    /// Name of the current runs such as name of the device to be benchmarked
    #[arg(required = true)]
    name: String,

    /// Output directory of benchmark results
    #[arg(short, long, default_value_t = format!("benchmark_results"))]
    output_directory: String,

    #[command(subcommand)]
    commands: Option<SubCommand>,

    /// Number of samples to be generated for each measurement
    #[arg(short, long, default_value_t = 5)]
    sample_size: usize,

    /// Do not save results
    #[arg(long, default_value_t = false)]
    no_save: bool,

    /// Disables output
    #[arg(long, default_value_t = false)]
    no_output: bool,
}

fn main() {
    let args = CLIArgs::parse();

    if let Some(command) = &args.commands {
        if !args.no_output {
            println!("Generating Results for device {}", args.name);
        }
        match command {
            SubCommand::Threads { threads } => {
                thread_scaling(&args, threads.clone());
            }
            SubCommand::GridSize {
                dimensions,
                n_workers,
            } => {
                grid_size_scaling(&args, dimensions.clone(), *n_workers);
            }
        }
    }
}
