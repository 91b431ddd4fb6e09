use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use stylegenie::app::App;
use stylegenie::models::{Config, Occasion, OutfitSuggestion, DEFAULT_WEATHER};
use stylegenie::session::{GenerationPhase, StyleSession};
use stylegenie::weather::Coordinates;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stylegenie")]
#[command(about = "Your AI personal stylist")]
struct CliArgs {
    /// Where you are heading: casual, office, party or date.
    #[arg(value_name = "OCCASION", value_parser = parse_occasion_arg)]
    occasion: Occasion,

    /// Free-text weather description.
    #[arg(long, default_value = DEFAULT_WEATHER)]
    weather: String,

    /// Look up the weather for LAT,LON instead of using --weather.
    #[arg(long, value_name = "LAT,LON", value_parser = parse_location_arg)]
    location: Option<Coordinates>,

    /// Skip the outfit picture.
    #[arg(long)]
    no_image: bool,

    /// Write the generated picture to this file.
    #[arg(long, value_name = "PATH")]
    image_out: Option<PathBuf>,

    /// Print the suggestion as JSON.
    #[arg(long)]
    json: bool,

    /// Override the text model.
    #[arg(long)]
    text_model: Option<String>,

    /// Override the image model.
    #[arg(long)]
    image_model: Option<String>,
}

fn parse_occasion_arg(input: &str) -> std::result::Result<Occasion, String> {
    input.parse()
}

fn parse_location_arg(input: &str) -> std::result::Result<Coordinates, String> {
    input.parse().map_err(|e: stylegenie::Error| e.to_string())
}

fn render_suggestion(suggestion: &OutfitSuggestion) -> String {
    let mut out = format!("{}\n{}\n", suggestion.title, suggestion.description);

    out.push_str("\nThe look\n");
    for item in &suggestion.items {
        out.push_str(&format!(
            "  - {}: {}\n      {}\n",
            item.category, item.name, item.reason
        ));
    }

    out.push_str("\nStyle tips\n");
    for (i, tip) in suggestion.style_tips.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, tip));
    }
    out
}

/// Stdout text for a settled session, or the user-facing error when no
/// suggestion was produced.
fn report(state: &StyleSession, json: bool) -> Result<String> {
    let suggestion = state
        .suggestion()
        .ok_or_else(|| anyhow!("{}", state.error().unwrap_or("No suggestion was generated")))?;

    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(suggestion)?))
    } else {
        Ok(render_suggestion(suggestion))
    }
}

/// Writes the decoded image bytes to `path`. Returns the byte count, or
/// `None` when the session holds no image and nothing was written.
fn write_image(state: &StyleSession, path: &Path) -> Result<Option<usize>> {
    let Some(image) = state.image() else {
        warn!("No image generated; nothing written to {}", path.display());
        return Ok(None);
    };

    let bytes = image.decode().context("Image payload is not valid base64")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write image to {}", path.display()))?;
    info!(
        "Saved {} image ({} bytes) to {}",
        image.mime_type(),
        bytes.len(),
        path.display()
    );
    Ok(Some(bytes.len()))
}

fn apply_overrides(config: &mut Config, args: &CliArgs) {
    if let Some(model) = &args.text_model {
        config.text_model = model.clone();
    }
    if let Some(model) = &args.image_model {
        config.image_model = model.clone();
    }
    if args.no_image {
        config.generate_images = false;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stylegenie=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);

    let app = App::from_config(&config);
    let session = Mutex::new(StyleSession::with_weather(args.weather.clone()));

    if let Some(coords) = args.location {
        app.use_location(&session, coords).await?;
    }

    info!("Styling for {}", args.occasion.label());
    let outcome = app.generate(&session, args.occasion.id()).await?;

    let state = session
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    match report(&state, args.json) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }

    if let Some(path) = &args.image_out {
        write_image(&state, path)?;
    }

    if outcome.phase() != Some(GenerationPhase::ImageReady) {
        if let Some(placeholder) = state.display_image() {
            info!("Placeholder image: {}", placeholder);
        }
    }

    Ok(())
}
