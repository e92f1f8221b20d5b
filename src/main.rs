use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inkstamp::config::EngineConfig;
use inkstamp::watermark::Position;
use inkstamp::{Engine, RenderRequest, WatermarkSettings};
use std::path::PathBuf;

/// Inkstamp - burn text watermarks into images and videos
#[derive(Parser, Debug)]
#[command(name = "inkstamp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark one image or video and print the output path
    Render(RenderArgs),
    /// Validate the configuration and exit
    CheckConfig,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Source image or video
    input: PathBuf,

    /// YAML file with watermark settings (overrides configured defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    text: Option<String>,

    /// Glyph height in pixels
    #[arg(long)]
    font_size: Option<u32>,

    /// 0 (invisible) to 255 (opaque)
    #[arg(long)]
    opacity: Option<u8>,

    /// top_left, top_right, bottom_left, bottom_right or center
    #[arg(long)]
    position: Option<String>,

    /// white, black, red, green, blue, yellow, cyan or magenta
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    font_family: Option<String>,
}

impl RenderArgs {
    /// Configured defaults, then the settings file, then individual flags.
    fn resolve_settings(&self, defaults: &WatermarkSettings) -> Result<WatermarkSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings file {}", path.display()))?;
                serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Invalid settings file {}", path.display()))?
            }
            None => defaults.clone(),
        };

        if let Some(text) = &self.text {
            settings.text = text.clone();
        }
        if let Some(font_size) = self.font_size {
            settings.font_size = font_size;
        }
        if let Some(opacity) = self.opacity {
            settings.opacity = opacity;
        }
        if let Some(position) = &self.position {
            settings.position = Position::from_name(position);
        }
        if let Some(color) = &self.color {
            settings.color = color.clone();
        }
        if let Some(font_family) = &self.font_family {
            settings.font_family = font_family.clone();
        }
        Ok(settings)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    inkstamp::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        output_dir = %config.output_dir.display(),
        codec = %config.video.codec,
        font_paths = config.fonts.search_paths.len(),
        "Configuration loaded successfully"
    );

    match cli.command {
        Command::CheckConfig => {
            println!("configuration ok");
        }
        Command::Render(args) => {
            let settings = args.resolve_settings(&config.defaults)?;
            let engine = Engine::from_config(&config);
            let request = RenderRequest::new(&args.input, settings);

            let output = engine
                .render_async(request)
                .await
                .with_context(|| format!("Failed to watermark {}", args.input.display()))?;
            println!("{}", output.display());
        }
    }

    Ok(())
}
