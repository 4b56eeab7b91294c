use clap::{Parser, Subcommand};
use simple_caption::caption::{CaptionRequest, Captioner};
use simple_caption::imaging::{self, RustBackend};
use simple_caption::server::{self, ServerState};
use simple_caption::types::ImageBounds;
use simple_caption::{config, logging, output};
use std::path::PathBuf;
use tracing::info;

/// Caption style flags shared by `render` and `plan`.
#[derive(clap::Args, Clone)]
struct CaptionArgs {
    /// Caption text
    #[arg(long)]
    text: String,

    /// Text alignment: start, middle, end
    #[arg(long)]
    align: Option<String>,

    /// Font size: small_extra, small, medium, large, large_extra
    #[arg(long)]
    font_size: Option<String>,

    /// Color name from the [colors] table
    #[arg(long)]
    color: Option<String>,
}

impl CaptionArgs {
    fn into_request(self) -> CaptionRequest {
        CaptionRequest {
            text: self.text,
            alignment: self.align,
            font_size: self.font_size,
            color: self.color,
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-caption")]
#[command(about = "Word-wrapped, centered caption overlays for images")]
#[command(long_about = "\
Word-wrapped, centered caption overlays for images

The caption is wrapped to the image width using an average glyph width
model, centered vertically, and drawn over the image at one of five font
sizes. Text that cannot fit is rejected instead of being clipped.

Validation order (first failure wins):
  alignment → font size → color → characters → length → layout

Run 'simple-caption gen-config' to generate a documented caption.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (stock defaults apply when missing)
    #[arg(long, default_value = "caption.toml", global = true)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Caption image files or directories of images
    Render {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        caption: CaptionArgs,

        /// Output directory
        #[arg(long, default_value = "processed")]
        output: PathBuf,
    },
    /// Compute the caption layout for an image size without rendering
    Plan {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        #[command(flatten)]
        caption: CaptionArgs,

        /// Print the plan as JSON
        #[arg(long, conflicts_with = "svg")]
        json: bool,

        /// Print the overlay as SVG
        #[arg(long)]
        svg: bool,
    },
    /// Serve POST /thumbnail over HTTP
    Serve {
        /// Listen address (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print a stock caption.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Render {
            inputs,
            caption,
            output: output_dir,
        } => {
            let captioner = Captioner::new(config::load_config(&cli.config)?)?;
            init_thread_pool(&captioner.config().processing);
            let backend = RustBackend::new(&captioner.config().render)?;
            info!(fonts = backend.font_count(), "font database loaded");

            let sources = imaging::collect_sources(&inputs)?;
            info!(images = sources.len(), output = %output_dir.display(), "rendering");

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_batch_event(&event));
                }
            });
            let summary = imaging::caption_batch(
                &backend,
                &captioner,
                &sources,
                &output_dir,
                &caption.into_request(),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_batch_summary(&summary);

            if !summary.is_success() {
                let failed = summary.failed.len();
                return Err(format!("{failed} of {} images failed", sources.len()).into());
            }
        }
        Command::Plan {
            width,
            height,
            caption,
            json,
            svg,
        } => {
            let captioner = Captioner::new(config::load_config(&cli.config)?)?;
            let result = captioner.plan(ImageBounds::new(width, height), &caption.into_request());
            match result {
                Ok(plan) if json => println!("{}", serde_json::to_string_pretty(&plan)?),
                Ok(plan) if svg => {
                    println!("{}", plan.overlay.to_svg(&captioner.config().render.font_family))
                }
                Ok(plan) => output::print_plan(&plan),
                Err(e) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&e.report())?);
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Serve { bind } => {
            let captioner = Captioner::new(config::load_config(&cli.config)?)?;
            let bind = bind.unwrap_or_else(|| captioner.config().server.bind.clone());
            let backend = RustBackend::new(&captioner.config().render)?;
            info!(fonts = backend.font_count(), "font database loaded");

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::run_server(ServerState::new(captioner, backend), &bind))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
