use clap::Parser;
use log::{error, LevelFilter};
use meanforce::discovery::{normalize_dir, DEFAULT_TAIL};
use meanforce::error::MfError;
use meanforce::geometry::AlignmentResult;
use meanforce::series::{Discard, FrameObserver, SeriesWriter};
use meanforce::session::{FileStatus, InputSet, ReportLine, Session, SessionConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Mean radial force and torque between the two halves of a symmetric system.
#[derive(Parser, Debug)]
#[command(name = "meanforce", version)]
struct Args {
    /// Force trajectory files; a single file or a list.
    #[arg(required_unless_present = "scan")]
    files: Vec<PathBuf>,

    /// Process every `<head>block.<n><tail>` file under this directory instead.
    #[arg(long, value_name = "DIR", conflicts_with = "files")]
    scan: Option<String>,

    /// Total number of atoms in both subunits.
    #[arg(short, long)]
    natoms: usize,

    /// Weight centers and alignment by atomic mass.
    #[arg(long, requires = "psf")]
    mass: bool,

    /// Topology file with the atomic masses.
    #[arg(long, value_name = "FILE")]
    psf: Option<PathBuf>,

    /// Suffix of block files in directory mode.
    #[arg(long, default_value = DEFAULT_TAIL)]
    tail: String,

    /// Write the per-frame force and torque series to this file.
    #[arg(long, value_name = "FILE")]
    series: Option<PathBuf>,

    /// More diagnostics; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let filter = format!("meanforce={level}");
    if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&filter))
            .init();
    } else {
        env_logger::init();
    }
}

fn print_alignment(alignment: &AlignmentResult) {
    let r = &alignment.rotation;
    let t = &alignment.translation;
    for (name, c) in ["A", "B"].iter().zip(&alignment.centers) {
        println!("center {name}: {:10.5} {:10.5} {:10.5}", c.x, c.y, c.z);
    }
    println!("rmsd {}", alignment.rmsd);
    println!("trans : {:10.5} {:10.5} {:10.5}\n", t.x, t.y, t.z);
    println!(
        "rot   : {:10.5} {:10.5} {:10.5}\n        {:10.5} {:10.5} {:10.5}\n        {:10.5} {:10.5} {:10.5}\n",
        r[(0, 0)],
        r[(0, 1)],
        r[(0, 2)],
        r[(1, 0)],
        r[(1, 1)],
        r[(1, 2)],
        r[(2, 0)],
        r[(2, 1)],
        r[(2, 2)],
    );
}

fn run(args: Args) -> Result<usize, MfError> {
    let config = SessionConfig {
        natoms: args.natoms,
        use_mass: args.mass,
        topology: args.psf,
        block_tail: args.tail,
    };
    let session = Session::new(config)?;

    let input = match args.scan {
        Some(dir) => {
            let dir = normalize_dir(&dir);
            eprintln!("scanning directory [{}]", dir.display());
            InputSet::Directory(dir)
        }
        None if args.files.len() == 1 => InputSet::Single(args.files[0].clone()),
        None => InputSet::List(args.files),
    };

    let mut series = args.series.as_deref().map(SeriesWriter::create).transpose()?;
    let mut discard = Discard;
    let observer: &mut dyn FrameObserver = match series.as_mut() {
        Some(writer) => writer,
        None => &mut discard,
    };
    let report = session.run(&input, observer)?;
    if let Some(writer) = series.as_mut() {
        writer.flush()?;
    }

    if let Some(alignment) = &report.alignment {
        print_alignment(alignment);
    }
    for file in &report.files {
        match &file.status {
            FileStatus::Processed(summary) => {
                if let Some(err) = summary.malformed() {
                    println!("{}: stopped early ({err})", file.path.display());
                }
                println!(
                    "{}",
                    ReportLine {
                        alignment: report.alignment.as_ref(),
                        statistics: &file.cumulative,
                    }
                )
            }
            FileStatus::Failed(err) => println!("{}: skipped ({err})", file.path.display()),
        }
    }
    Ok(report.failed())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            error!("{failed} file(s) could not be processed");
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
