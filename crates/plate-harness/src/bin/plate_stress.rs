//! Repeatedly build the average plate and log build times with host and
//! process resource usage.
//!
//! ```text
//! plate-stress [iterations] [--mock]
//! ```
//!
//! Rows go to `stress-log.tsv` in the working directory; plates go to the
//! configured output directory (`WEIGHT_PLATE_OUTPUT_DIR` overrides it).

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use cad_backend::{CadBackend, MockCad, TruckCad};
use plate_builder::{BuildConfig, PlateBuilder};
use plate_harness::{average_parameters, logging, run_stress, StressConfig};

const LOG_FILE: &str = "stress-log.tsv";

struct Args {
    iterations: Option<u64>,
    mock: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        iterations: None,
        mock: false,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--mock" => args.mock = true,
            "-h" | "--help" => {
                return Err("usage: plate-stress [iterations] [--mock]".to_string());
            }
            value => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid iteration count: {value}"))?;
                args.iterations = Some(n);
            }
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let args = parse_args()?;

    let builder = PlateBuilder::new(BuildConfig::from_env())?;

    let mut stress = StressConfig::default();
    if let Some(n) = args.iterations {
        stress.iterations = n;
    }

    let mut cad: Box<dyn CadBackend> = if args.mock {
        Box::new(MockCad::new())
    } else {
        Box::new(TruckCad::default())
    };

    let mut log = BufWriter::new(File::create(LOG_FILE)?);
    tracing::info!(
        iterations = stress.iterations,
        mock = args.mock,
        output_dir = %builder.config().output_dir.display(),
        "starting stress run"
    );
    let summary = run_stress(
        &builder,
        &average_parameters(),
        cad.as_mut(),
        &stress,
        &mut log,
    )?;
    println!("{summary}");
    Ok(())
}
