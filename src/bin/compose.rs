use aging_collage::config::TomlConfig;
use aging_collage::utils::{logger, validation::Validate};
use aging_collage::{CollageComposer, CollageLayout};
use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
#[command(name = "aging-compose")]
#[command(about = "Render a before/after collage from two local images, no network")]
struct Args {
    /// Template PNG with the background art
    #[arg(short, long, env = "TEMPLATE_PATH", default_value = "data/template.png")]
    template: String,

    /// Original photo (left slot)
    #[arg(long)]
    before: String,

    /// Generated photo (right slot)
    #[arg(long)]
    after: String,

    /// Where to write the PNG collage
    #[arg(short, long, default_value = "collage.png")]
    output: String,

    /// Optional TOML file with a [layout] section
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let layout = match &args.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?
            .layout
            .unwrap_or_default(),
        None => CollageLayout::default(),
    };
    layout.validate().context("invalid collage layout")?;

    let before = std::fs::read(&args.before)
        .with_context(|| format!("failed reading {}", args.before))?;
    let after =
        std::fs::read(&args.after).with_context(|| format!("failed reading {}", args.after))?;

    tracing::info!("🖼️ Composing {} + {} on {}", args.before, args.after, args.template);
    let collage = CollageComposer::new(&args.template, layout)
        .compose(&before, &after)
        .context("collage composition failed")?;

    std::fs::write(&args.output, &collage)
        .with_context(|| format!("failed to write {}", args.output))?;
    tracing::info!("📁 Collage saved to: {} ({} bytes)", args.output, collage.len());
    println!("✅ Collage saved to: {}", args.output);
    Ok(())
}
