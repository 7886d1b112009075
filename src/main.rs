use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use quer::{encode, render, EccLevel};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Png,
    Ppm,
}

#[derive(Parser, Debug)]
#[command(about = "Encode data into an ISO/IEC 18004 QR Code symbol")]
struct Args {
    /// Path to read the payload from. Defaults to stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to write the rendered image to. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Error-correction level L (~7% recovery). Default if none given.
    #[arg(short = 'l', long, group = "level")]
    low: bool,
    /// Error-correction level M (~15% recovery).
    #[arg(short = 'm', long, group = "level")]
    medium: bool,
    /// Error-correction level Q (~25% recovery).
    #[arg(short = 'q', long, group = "level")]
    quartile: bool,
    /// Error-correction level H (~30% recovery).
    #[arg(short = 'h', long, group = "level")]
    high: bool,

    /// Pixels per module in the rendered image.
    #[arg(short = 'p', long, default_value_t = 20)]
    pixels_per_module: u32,

    /// Output image format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,
}

impl Args {
    fn level(&self) -> EccLevel {
        if self.medium {
            EccLevel::M
        } else if self.quartile {
            EccLevel::Q
        } else if self.high {
            EccLevel::H
        } else {
            EccLevel::L
        }
    }
}

fn read_payload(path: &Option<PathBuf>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match path {
        Some(p) => {
            File::open(p)?.read_to_end(&mut buf)?;
        }
        None => {
            io::stdin().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

fn write_output(path: &Option<PathBuf>, render: impl FnOnce(&mut dyn Write) -> quer::Result<()>) -> quer::Result<()> {
    match path {
        Some(p) => render(&mut File::create(p)?),
        None => render(&mut io::stdout().lock()),
    }
}

fn run() -> quer::Result<()> {
    let args = Args::parse();

    if args.pixels_per_module == 0 {
        return Err(quer::Error::InvariantViolated("--pixels-per-module must be positive".into()));
    }

    let payload = read_payload(&args.input)?;
    let symbol = encode(&payload, args.level())?;

    write_output(&args.output, |w| match args.format {
        OutputFormat::Png => render::write_png(&symbol, args.pixels_per_module, w),
        OutputFormat::Ppm => render::write_ppm(&symbol, args.pixels_per_module, w),
    })
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
