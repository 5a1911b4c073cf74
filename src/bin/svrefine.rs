use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use svrefine::config::{RefineConfig, SvType};
use svrefine::input::require_reference;
use svrefine::output::RunSummary;
use svrefine::pipeline::RefineRunner;

#[derive(Parser)]
#[command(name = "svrefine")]
#[command(
    about = "Base-exact structural variant breakpoint refinement",
    long_about = "Re-aligns the split-read consensus of each structural variant call \
                  against the local reference to recover base-exact breakpoints, \
                  microhomology, and consensus quality annotations."
)]
struct Cli {
    /// Log verbosity level
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,
    /// Write log output to a file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<String>,
    /// Append to log file instead of truncating
    #[arg(long, global = true)]
    append_log: bool,
    /// SV type to refine (records of other types are dropped)
    #[arg(short = 't', long = "type", value_enum, default_value_t = SvType::Deletion)]
    sv_type: SvType,
    /// Reference genome FASTA file (plain or bgzip-compressed)
    #[arg(short, long, required = true)]
    genome: String,
    /// Maximum SV span eligible for refinement (bp)
    #[arg(short, long, default_value_t = 500)]
    maxlen: usize,
    /// Output VCF file (bgzip-compressed, tabix-indexed)
    #[arg(short = 'f', long, default_value = "out.vcf.gz")]
    outfile: String,
    /// Force overwrite of existing output files
    #[arg(long)]
    force: bool,
    /// Input VCF file. Must be bgzip-compressed and indexed.
    #[arg(required = true)]
    infile: String,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Startup checks that must refuse the run before any output is produced.
fn preflight(outfile: &str, force: bool, genome: &str) -> Result<()> {
    if !force && Path::new(outfile).exists() {
        bail!(
            "Output file {} already exists. Use --force to overwrite.",
            outfile
        );
    }
    require_reference(genome)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder
        .filter_level(cli.log_level.to_level_filter())
        .format_module_path(false);
    if let Some(ref path) = cli.log_file {
        let file = if cli.append_log {
            std::fs::File::options().create(true).append(true).open(path)
        } else {
            std::fs::File::create(path)
        }
        .unwrap_or_else(|e| panic!("Could not open log file '{}': {}", path, e));
        log_builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    log_builder.init();

    if let Err(e) = preflight(&cli.outfile, cli.force, &cli.genome) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    if matches!(cli.sv_type, SvType::Duplication | SvType::Inversion) {
        warn!(
            "{} records are carried through with symbolic alleles only; \
             split-point refinement applies to DEL and INS.",
            cli.sv_type.tag()
        );
    }

    let config = RefineConfig {
        sv_type: cli.sv_type,
        max_span: cli.maxlen,
    };
    let runner = RefineRunner::new(&cli.infile, &cli.genome, &cli.outfile, config);

    match runner.run() {
        Ok(stats) => {
            info!(
                "Done: {} records ({} refined, {} symbolic, {} skipped) across {} chromosomes",
                stats.records, stats.refined, stats.symbolic, stats.skipped, stats.chromosomes
            );
            let summary = RunSummary::new(cli.sv_type.tag(), stats);
            if let Err(e) = summary.write_next_to(&cli.outfile) {
                error!("Error writing run summary: {}", e);
                return ExitCode::FAILURE;
            }
            info!("Output written to {}", cli.outfile);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error refining {}: {}", cli.infile, e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_rejects_missing_reference() {
        let err = preflight("svrefine_no_such_out.vcf.gz", false, "/nonexistent/ref.fa");
        assert!(err.is_err());
    }

    #[test]
    fn test_preflight_existing_outfile_requires_force() {
        let dir = std::env::temp_dir();
        let out = dir.join("svrefine_test_existing_out.vcf.gz");
        let genome = dir.join("svrefine_test_preflight_ref.fa");
        std::fs::write(&out, b"x").unwrap();
        std::fs::write(&genome, b">chr1\nACGT\n").unwrap();

        let out_s = out.to_str().unwrap();
        let genome_s = genome.to_str().unwrap();
        assert!(preflight(out_s, false, genome_s).is_err());
        assert!(preflight(out_s, true, genome_s).is_ok());

        std::fs::remove_file(&out).ok();
        std::fs::remove_file(&genome).ok();
    }
}
