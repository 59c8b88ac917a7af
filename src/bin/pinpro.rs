//! CLI for PinPro - AI Pinterest pin generation.

use clap::{Args, Parser, Subcommand};
use pinpro::compose::Color;
use pinpro::config::StudioConfig;
use pinpro::gate::{ApiKeyGate, KeySlot, TerminalKeyEnvironment};
use pinpro::image::ImageProviderExt;
use pinpro::workflow::{Completion, PinStudio};
use pinpro::{parse_suggestions, CreativeStyle, ImageQuality, Resolution};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinpro")]
#[command(about = "Generate Pinterest pins with Gemini and a headline overlay")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a pin and export it as PNG
    Generate(GenerateArgs),

    /// Ask the assistant for prompt ideas about a topic
    Suggest(SuggestArgs),

    /// Ask for headline, description and color ideas about a topic
    Ideas {
        /// Topic or business idea
        topic: String,
    },

    /// List creative styles
    Styles,

    /// List canvas presets
    Resolutions,

    /// Show settings, profile and the pending handoff prompt
    Status,
}

#[derive(Args)]
struct GenerateArgs {
    /// Image prompt. Falls back to the prompt saved by `suggest --pick`.
    prompt: Option<String>,

    /// Canvas preset (1000x1500, 1000x1000, 1080x1920)
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Creative style key (see `pinpro styles`)
    #[arg(short, long)]
    style: Option<CreativeStyle>,

    /// Quality tier: 1K or 2K
    #[arg(short, long)]
    quality: Option<ImageQuality>,

    /// Overlay headline
    #[arg(short, long)]
    text: Option<String>,

    /// Overlay color, #rrggbb
    #[arg(long)]
    color: Option<Color>,

    /// Overlay font size (20-100)
    #[arg(long)]
    font_size: Option<u32>,

    /// Directory for the exported PNG
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Retries for rate limits and server errors
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[derive(Args)]
struct SuggestArgs {
    /// Topic or business idea
    topic: String,

    /// Save suggestion N (1-based) as the prompt for the next `generate`
    #[arg(long)]
    pick: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pinpro=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StudioConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate(args) => generate_pin(args, &config, cli.json).await?,
        Commands::Suggest(args) => suggest(args, &config, cli.json).await?,
        Commands::Ideas { topic } => ideas(&topic, &config, cli.json).await?,
        Commands::Styles => list_styles(cli.json)?,
        Commands::Resolutions => list_resolutions(cli.json)?,
        Commands::Status => status(&config, cli.json)?,
    }

    Ok(())
}

async fn generate_pin(
    args: GenerateArgs,
    config: &StudioConfig,
    json_output: bool,
) -> anyhow::Result<()> {
    let slot = KeySlot::default();
    let gate = ApiKeyGate::new(Arc::new(TerminalKeyEnvironment::new(slot.clone())));
    let provider = config.image_provider(&slot);

    let mut studio = PinStudio::new(gate);
    studio.set_resolution(config.resolution);
    studio.set_style(config.style);
    studio.set_quality(config.quality);

    studio.mount(&config.handoff_slot()).await?;
    if let Some(prompt) = args.prompt {
        studio.set_prompt(prompt);
    }
    if let Some(resolution) = args.resolution {
        studio.set_resolution(resolution);
    }
    if let Some(style) = args.style {
        studio.set_style(style);
    }
    if let Some(quality) = args.quality {
        studio.set_quality(quality);
    }
    if let Some(text) = args.text {
        studio.set_overlay_text(text);
    }
    if let Some(color) = args.color {
        studio.set_overlay_color(color);
    }
    if let Some(size) = args.font_size {
        studio.set_font_size(size);
    }

    let Some(ticket) = studio.begin_generation() else {
        anyhow::bail!("Nothing to generate: pass a prompt or run `pinpro suggest --pick N` first");
    };
    if ticket.needs_credential() {
        studio.select_credential(&ticket).await;
        if let Some(notice) = studio.notice() {
            eprintln!("{notice}");
        }
    }
    let result = provider
        .generate_with_retries(ticket.request(), args.retries)
        .await;

    match studio.complete_generation(ticket, result) {
        Completion::Applied => {}
        Completion::Failed(error) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&studio.status())?);
            }
            anyhow::bail!(error.message);
        }
        Completion::Stale => anyhow::bail!("generation was superseded"),
    }

    let dir = args.output_dir.unwrap_or_else(|| config.output_dir());
    let Some(path) = studio.export(&dir)? else {
        anyhow::bail!("no image to export");
    };

    let image = studio.image().map(|image| &image.generated);
    if json_output {
        let result = serde_json::json!({
            "type": "pin",
            "success": true,
            "output": path.display().to_string(),
            "resolution": studio.resolution(),
            "style": studio.style(),
            "quality": studio.quality(),
            "overlay": studio.overlay(),
            "mime_type": image.map(|i| i.format.mime_type()),
            "model": image.and_then(|i| i.metadata.model.clone()),
            "duration_ms": image.and_then(|i| i.metadata.duration_ms),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Exported pin: {}", path.display());
        if let Some(duration) = image.and_then(|i| i.metadata.duration_ms) {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn suggest(args: SuggestArgs, config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let assistant = config.assistant(&KeySlot::default());
    let Some(text) = assistant.suggest_or_fallback(&args.topic).await else {
        anyhow::bail!("topic must not be empty");
    };
    let suggestions = parse_suggestions(&text);

    let picked = match args.pick {
        Some(n) => {
            let Some(prompt) = n.checked_sub(1).and_then(|i| suggestions.get(i)) else {
                anyhow::bail!("no suggestion #{n} (got {})", suggestions.len());
            };
            config.handoff_slot().store(prompt)?;
            Some(prompt.clone())
        }
        None => None,
    };

    if json_output {
        let result = serde_json::json!({
            "text": text,
            "suggestions": suggestions,
            "picked": picked,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{text}");
        if let Some(prompt) = picked {
            println!("\nSaved for `pinpro generate`: {prompt}");
        }
    }
    Ok(())
}

async fn ideas(topic: &str, config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let assistant = config.assistant(&KeySlot::default());
    let ideas = assistant.marketing_ideas(topic).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&ideas)?);
    } else if ideas.is_empty() {
        println!("No ideas returned.");
    } else {
        for (i, idea) in ideas.iter().enumerate() {
            println!("{}. {} [{}]", i + 1, idea.headline, idea.hex_color);
            println!("   {}", idea.description);
        }
    }
    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct StyleInfo {
        key: &'static str,
        label: &'static str,
        prompt_suffix: &'static str,
    }

    let styles: Vec<StyleInfo> = CreativeStyle::ALL
        .iter()
        .map(|s| StyleInfo {
            key: s.key(),
            label: s.label(),
            prompt_suffix: s.prompt_suffix(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&styles)?);
    } else {
        println!("Creative styles:\n");
        for s in &styles {
            println!("  {:<20} {}", s.key, s.label);
        }
    }
    Ok(())
}

fn list_resolutions(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ResolutionInfo {
        key: &'static str,
        width: u32,
        height: u32,
        aspect_ratio: &'static str,
    }

    let presets: Vec<ResolutionInfo> = Resolution::ALL
        .iter()
        .map(|r| {
            let spec = r.spec();
            ResolutionInfo {
                key: r.key(),
                width: spec.width,
                height: spec.height,
                aspect_ratio: spec.aspect_ratio.as_str(),
            }
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else {
        println!("Canvas presets:\n");
        for p in &presets {
            println!("  {:<10} {}x{} ({})", p.key, p.width, p.height, p.aspect_ratio);
        }
    }
    Ok(())
}

fn status(config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let handoff = config.handoff_slot();
    let pending = handoff.path().exists();
    let profile = &config.profile;

    if json_output {
        let result = serde_json::json!({
            "resolution": config.resolution,
            "style": config.style,
            "quality": config.quality,
            "output_dir": config.output_dir().display().to_string(),
            "state_dir": config.state_dir().display().to_string(),
            "api_key_configured": config.api_key.is_some(),
            "pending_prompt": pending,
            "profile": profile,
            "remaining_pins": profile.remaining_pins(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} ({:?} plan)", profile.name, profile.plan);
        println!(
            "Pins today: {}/{} ({} left)",
            profile.pins_used_today,
            profile.daily_pin_limit,
            profile.remaining_pins()
        );
        println!(
            "Defaults: {} / {} / {}",
            config.resolution, config.style, config.quality
        );
        println!(
            "API key: {}",
            if config.api_key.is_some() { "configured" } else { "missing" }
        );
        if pending {
            println!("Pending prompt: {}", handoff.path().display());
        }
    }
    Ok(())
}
