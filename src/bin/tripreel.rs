use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use tripreel::{
    CancelToken, Itinerary, Pipeline, Quality, RenderConfig, Settings, determine_mood,
};

#[derive(Parser, Debug)]
#[command(name = "tripreel", version, about = "Render a trip itinerary into an MP4 slideshow")]
struct Cli {
    /// Settings JSON. Missing file means defaults.
    #[arg(long, global = true, default_value = "tripreel.json")]
    settings: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Resolve and select images, printing the selection as JSON.
    Select(SelectArgs),
    /// Print the soundtrack mood of an itinerary.
    Mood(MoodArgs),
    /// Delete every cached image.
    ClearCache,
}

#[derive(Args, Debug)]
struct RenderOverrides {
    /// Output resolution preset.
    #[arg(long, value_enum)]
    quality: Option<QualityChoice>,

    #[arg(long)]
    max_images: Option<usize>,

    /// Seed for source rotation, transition choice and shuffling.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    no_captions: bool,

    /// Worker threads for frame synthesis.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input itinerary JSON.
    #[arg(long)]
    itinerary: PathBuf,

    /// Output MP4 path. Defaults to `{videos_dir}/{destination}_{timestamp}.mp4`.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    no_music: bool,

    #[command(flatten)]
    overrides: RenderOverrides,
}

#[derive(Args, Debug)]
struct SelectArgs {
    #[arg(long)]
    itinerary: PathBuf,

    #[command(flatten)]
    overrides: RenderOverrides,
}

#[derive(Args, Debug)]
struct MoodArgs {
    #[arg(long)]
    itinerary: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Standard,
    High,
}

impl From<QualityChoice> for Quality {
    fn from(q: QualityChoice) -> Self {
        match q {
            QualityChoice::Standard => Quality::Standard,
            QualityChoice::High => Quality::High,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    match cli.cmd {
        Command::Render(args) => {
            let mut settings = load_settings(&cli.settings)?;
            let mut cfg = apply_overrides(&mut settings, &args.overrides);
            if args.no_music {
                cfg.music = false;
            }
            let itinerary = load_itinerary(&args.itinerary)?;
            let pipeline = Pipeline::from_settings(&settings)?;

            let artifact = pipeline.render_itinerary(
                &itinerary,
                &cfg,
                args.out.as_deref(),
                &CancelToken::new(),
            )?;
            println!("{}", serde_json::to_string_pretty(&artifact)?);
        }
        Command::Select(args) => {
            let mut settings = load_settings(&cli.settings)?;
            let cfg = apply_overrides(&mut settings, &args.overrides);
            let itinerary = load_itinerary(&args.itinerary)?;
            let pipeline = Pipeline::from_settings(&settings)?;

            let selected = pipeline.select_images(&itinerary, &cfg, &CancelToken::new())?;
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
        Command::Mood(args) => {
            let itinerary = load_itinerary(&args.itinerary)?;
            println!(
                "{}",
                determine_mood(&itinerary.destination, &itinerary.text())
            );
        }
        Command::ClearCache => {
            let settings = load_settings(&cli.settings)?;
            let pipeline = Pipeline::from_settings(&settings)?;
            let removed = pipeline.clear_cache()?;
            eprintln!("removed {removed} cached images");
        }
    }
    Ok(())
}

fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries command output.
    if json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    Settings::load(path).with_context(|| format!("load settings '{}'", path.display()))
}

fn load_itinerary(path: &Path) -> anyhow::Result<Itinerary> {
    Itinerary::load(path).with_context(|| format!("load itinerary '{}'", path.display()))
}

/// Apply CLI flags on top of the settings file and return the effective render config.
fn apply_overrides(settings: &mut Settings, o: &RenderOverrides) -> RenderConfig {
    let mut cfg = settings.render.clone();
    if let Some(q) = o.quality {
        cfg = cfg.with_quality(q.into());
    }
    if let Some(n) = o.max_images {
        cfg.max_images = n;
    }
    if o.no_captions {
        cfg.captions = false;
    }
    if o.threads.is_some() {
        cfg.threads = o.threads;
    }
    if let Some(seed) = o.seed {
        settings.seed = seed;
    }
    cfg
}
