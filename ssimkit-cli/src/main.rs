use clap::Parser;
use serde::{Deserialize, Serialize};
use ssimkit::io::{load_image_u16, load_image_u8};
use ssimkit::{MeanSimilarity, OwnedImage, Sample, Ssim, SsimConfig, SsimError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const EXIT_UNREADABLE: u8 = 1;
const EXIT_INCOMPATIBLE: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-channel SSIM between two images")]
struct Cli {
    /// Reference image.
    #[arg(required_unless_present = "print_example")]
    reference: Option<PathBuf>,
    /// Image compared against the reference.
    #[arg(required_unless_present = "print_example")]
    test: Option<PathBuf>,
    /// JSON file with SSIM parameters; flags below override it.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Luminance stability coefficient.
    #[arg(long)]
    k1: Option<f64>,
    /// Contrast stability coefficient.
    #[arg(long)]
    k2: Option<f64>,
    /// Sample bit depth; values above 8 load images as 16-bit.
    #[arg(long)]
    bit_depth: Option<u32>,
    /// Gaussian window side length (odd).
    #[arg(long)]
    window_size: Option<usize>,
    /// Gaussian standard deviation.
    #[arg(long)]
    sigma: Option<f64>,
    /// Run channels and rows on a single thread.
    #[arg(long)]
    sequential: bool,
    /// Print the scores as JSON.
    #[arg(long)]
    json: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
struct ConfigJson {
    k1: f64,
    k2: f64,
    bit_depth: u32,
    window_size: usize,
    sigma: f64,
    parallel: bool,
}

impl Default for ConfigJson {
    fn default() -> Self {
        let cfg = SsimConfig::default();
        Self {
            k1: cfg.k1,
            k2: cfg.k2,
            bit_depth: cfg.bit_depth,
            window_size: cfg.window_size,
            sigma: cfg.sigma,
            parallel: cfg.parallel,
        }
    }
}

impl ConfigJson {
    fn apply_overrides(mut self, cli: &Cli) -> Self {
        if let Some(k1) = cli.k1 {
            self.k1 = k1;
        }
        if let Some(k2) = cli.k2 {
            self.k2 = k2;
        }
        if let Some(bit_depth) = cli.bit_depth {
            self.bit_depth = bit_depth;
        }
        if let Some(window_size) = cli.window_size {
            self.window_size = window_size;
        }
        if let Some(sigma) = cli.sigma {
            self.sigma = sigma;
        }
        if cli.sequential {
            self.parallel = false;
        }
        self
    }

    fn into_config(self, channels: usize) -> SsimConfig {
        SsimConfig {
            k1: self.k1,
            k2: self.k2,
            bit_depth: self.bit_depth,
            window_size: self.window_size,
            sigma: self.sigma,
            channels,
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    width: usize,
    height: usize,
    channels: Vec<f64>,
}

impl Report {
    fn new(size: (usize, usize), mean: &MeanSimilarity) -> Self {
        Self {
            width: size.0,
            height: size.1,
            channels: mean.as_slice().to_vec(),
        }
    }

    fn to_text(&self) -> String {
        let mut line = String::from("mssim:");
        for (c, score) in self.channels.iter().enumerate() {
            line.push_str(&format!("  channel {c}: {score:.6}"));
        }
        line
    }
}

enum Failure {
    Unreadable { path: PathBuf, err: SsimError },
    Config(String),
    Ssim(SsimError),
}

impl Failure {
    fn report(&self) -> ExitCode {
        match self {
            Failure::Unreadable { path, err } => {
                eprintln!("could not read image {}: {err}", path.display());
                ExitCode::from(EXIT_UNREADABLE)
            }
            Failure::Config(reason) => {
                eprintln!("invalid configuration: {reason}");
                ExitCode::from(EXIT_INCOMPATIBLE)
            }
            Failure::Ssim(err) if err.is_incompatible_input() => {
                eprintln!("images incompatible: {err}");
                ExitCode::from(EXIT_INCOMPATIBLE)
            }
            Failure::Ssim(err) => {
                eprintln!("ssim failed: {err}");
                ExitCode::from(EXIT_INCOMPATIBLE)
            }
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<ConfigJson, Failure> {
    let Some(path) = path else {
        return Ok(ConfigJson::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|err| Failure::Config(format!("{}: {err}", path.display())))?;
    serde_json::from_str(&text).map_err(|err| Failure::Config(format!("{}: {err}", path.display())))
}

fn load<T>(
    path: &Path,
    loader: fn(&Path) -> Result<OwnedImage<T>, SsimError>,
) -> Result<OwnedImage<T>, Failure> {
    loader(path).map_err(|err| Failure::Unreadable {
        path: path.to_path_buf(),
        err,
    })
}

fn compare<T: Sample>(
    reference: &Path,
    test: &Path,
    config: ConfigJson,
    loader: fn(&Path) -> Result<OwnedImage<T>, SsimError>,
) -> Result<Report, Failure> {
    let reference = load(reference, loader)?;
    let test = load(test, loader)?;
    tracing::info!(
        width = reference.width(),
        height = reference.height(),
        channels = reference.channels(),
        "images loaded"
    );

    let mut engine =
        Ssim::with_config(config.into_config(reference.channels())).map_err(|err| match err {
            SsimError::InvalidConfig { reason } => Failure::Config(reason.to_string()),
            other => Failure::Ssim(other),
        })?;
    let mean = engine
        .compute_mean(reference.view(), test.view())
        .map_err(Failure::Ssim)?;
    let size = engine.map_size().ok_or(Failure::Ssim(SsimError::StaleResult))?;
    Ok(Report::new(size, &mean))
}

fn run(cli: &Cli) -> Result<String, Failure> {
    if cli.print_example {
        let json = serde_json::to_string_pretty(&ConfigJson::default())
            .map_err(|err| Failure::Config(err.to_string()))?;
        return Ok(json);
    }

    let (Some(reference), Some(test)) = (cli.reference.as_deref(), cli.test.as_deref()) else {
        return Err(Failure::Config(
            "a reference and a test image are required".into(),
        ));
    };
    let config = read_config(cli.config.as_deref())?.apply_overrides(cli);

    let report = if config.bit_depth > 8 {
        compare(reference, test, config, |p| load_image_u16(p))?
    } else {
        compare(reference, test, config, |p| load_image_u8(p))?
    };

    let out = if cli.json {
        serde_json::to_string_pretty(&report).map_err(|err| Failure::Config(err.to_string()))?
    } else {
        report.to_text()
    };
    Ok(out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "ssimkit=info".parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&cli) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(failure) => failure.report(),
    }
}
