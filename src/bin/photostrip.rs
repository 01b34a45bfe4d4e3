use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use photostrip::{BoothConfig, ExportFormat, RenderTarget};

#[derive(Parser, Debug)]
#[command(name = "photostrip", version)]
struct Cli {
    /// Booth configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available layouts.
    Layouts,
    /// List available filters.
    Filters,
    /// Compose photos into a layout and write the encoded result.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Encoded photos (PNG, JPEG or WEBP), in slot order.
    #[arg(required = true)]
    photos: Vec<PathBuf>,

    /// Layout id; defaults to the configured default.
    #[arg(long)]
    layout: Option<String>,

    /// Filter id; defaults to the configured default.
    #[arg(long)]
    filter: Option<String>,

    /// png, jpeg or webp.
    #[arg(long)]
    format: Option<ExportFormat>,

    /// JPEG quality in [0, 1].
    #[arg(long)]
    quality: Option<f32>,

    /// Output file.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Output directory; the file name is generated from the export prefix.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Downscale to fit, e.g. `1024x1024`.
    #[arg(long, value_parser = parse_size)]
    max_size: Option<(u32, u32)>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("invalid size component '{v}'"))
    };
    Ok((parse(w)?, parse(h)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Layouts => cmd_layouts(&config),
        Command::Filters => cmd_filters(&config),
        Command::Compose(args) => cmd_compose(&config, args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BoothConfig> {
    match path {
        Some(p) => BoothConfig::from_path(p).with_context(|| format!("load config '{}'", p.display())),
        None => {
            let mut config = BoothConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

fn cmd_layouts(config: &BoothConfig) -> anyhow::Result<()> {
    for l in config.layout_registry()?.list() {
        println!(
            "{:<14} {:>5}x{:<5} {} slot(s)  {}",
            l.id,
            l.canvas_width,
            l.canvas_height,
            l.photo_slot_count,
            l.description.as_deref().unwrap_or(&l.name)
        );
    }
    Ok(())
}

fn cmd_filters(config: &BoothConfig) -> anyhow::Result<()> {
    for f in config.filter_registry()?.list() {
        let transform = f.css().unwrap_or_else(|| format!("{:?}", f.transform));
        println!("{:<10} {:<16} {}", f.id, f.name, transform);
    }
    Ok(())
}

async fn cmd_compose(config: &BoothConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let layouts = config.layout_registry()?;
    let filters = config.filter_registry()?;
    let layout = layouts.get(args.layout.as_deref().unwrap_or(&config.default_layout))?;
    let filter = filters.get(args.filter.as_deref().unwrap_or(&config.default_filter))?;

    let mut session = config.session()?;
    for path in &args.photos {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read photo '{}'", path.display()))?;
        session
            .add_photo(bytes, Some(&filter.id))
            .with_context(|| format!("add photo '{}'", path.display()))?;
    }

    let mut target = RenderTarget::new(config.compositor());
    let surface = target
        .render(session.raw_sources(), layout, Some(filter))
        .await?;

    let (max_w, max_h) = args
        .max_size
        .unwrap_or((config.export.max_width, config.export.max_height));
    let surface = photostrip::fit_within(surface, max_w, max_h)?;

    let format = args.format.unwrap_or(config.export.format);
    let quality = args.quality.unwrap_or(config.export.quality);
    let bytes = photostrip::encode(&surface, format, quality)?;

    let written = match (args.out, args.out_dir) {
        (Some(out), _) => {
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("write '{}'", out.display()))?;
            out
        }
        (None, dir) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let name = photostrip::export::file_name_now(&config.export.file_prefix, format);
            photostrip::save(&bytes, &dir, &name).await?
        }
    };
    eprintln!("wrote {}", written.display());
    Ok(())
}
