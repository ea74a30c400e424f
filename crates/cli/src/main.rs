use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tbsolver_core::{calculation::Calculation, io::JobConfig};

#[derive(Parser, Debug)]
#[command(name = "tbsolver", about = "TOML-driven tight-binding job runner")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: PathBuf,
    /// Path to eigenvalue CSV output (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Path to LDOS CSV output (requires a [greens] ldos request)
    #[arg(long)]
    ldos_output: Option<PathBuf>,
    /// Override the wave vector from the config, as kx,ky,kz
    #[arg(long, value_delimiter = ',', num_args = 3)]
    wave_vector: Option<Vec<f64>>,
    /// Print one-line solver reports instead of the full form
    #[arg(long)]
    shortform: bool,
    /// Suppress progress logs (stderr)
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    if !cli.quiet {
        eprintln!("[cli] loading config {}", cli.config.display());
    }
    let raw = fs::read_to_string(&cli.config)?;
    let config: JobConfig = toml::from_str(&raw)?;
    let mut model = config.build_model()?;

    if let Some(wave_vector) = &cli.wave_vector {
        model.set_wave_vector([wave_vector[0], wave_vector[1], wave_vector[2]]);
        if !cli.quiet {
            eprintln!("[cli] overriding wave vector with {:?}", wave_vector);
        }
    }

    if !cli.quiet {
        eprintln!("{}", model.build_report()?);
    }

    let mut result = Calculation::default();
    model.calculate(&mut result)?;
    if !cli.quiet {
        let report = model.compute_report(cli.shortform)?;
        if !report.is_empty() {
            eprintln!("{report}");
        }
    }

    if let Some(eigenvalues) = &result.eigenvalues {
        emit_eigenvalue_csv(eigenvalues, cli.output.as_deref())?;
        if !cli.quiet {
            match &cli.output {
                Some(path) => {
                    eprintln!("wrote {} eigenvalue(s) to {}", eigenvalues.len(), path.display())
                }
                None => eprintln!("wrote {} eigenvalue(s) to stdout", eigenvalues.len()),
            }
        }
    }
    if let Some(ldos) = &result.ldos {
        let dest = cli.ldos_output.as_deref();
        emit_ldos_csv(ldos, dest)?;
        if !cli.quiet {
            match dest {
                Some(path) => eprintln!("wrote {} LDOS sample(s) to {}", ldos.len(), path.display()),
                None => eprintln!("wrote {} LDOS sample(s) to stdout", ldos.len()),
            }
        }
    }
    Ok(())
}

fn open_writer(dest: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match dest {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn emit_eigenvalue_csv(eigenvalues: &[f64], dest: Option<&Path>) -> io::Result<()> {
    let mut writer = open_writer(dest)?;
    writeln!(writer, "index,energy")?;
    for (index, energy) in eigenvalues.iter().enumerate() {
        writeln!(writer, "{index},{energy}")?;
    }
    writer.flush()
}

fn emit_ldos_csv(
    samples: &[tbsolver_core::calculation::LdosSample],
    dest: Option<&Path>,
) -> io::Result<()> {
    let mut writer = open_writer(dest)?;
    writeln!(writer, "energy,density")?;
    for sample in samples {
        writeln!(writer, "{},{}", sample.energy, sample.density)?;
    }
    writer.flush()
}
