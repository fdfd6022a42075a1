use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;
use gt_core::config::GlyphConfig;

pub mod app;
pub mod cli;
pub mod headless;
pub mod hotreload;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider les combinaisons d'arguments
    cli.validate()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config)?;
    log::info!(
        "Canvas {}x{}, {} tuiles/ligne, {} fps",
        config.width,
        config.height,
        config.tiles_per_row,
        config.framerate
    );

    // 5. Source visuelle + glyphes
    let source = pipeline::open_source(&cli, &config)?;
    let glyphs = pipeline::load_glyphs(cli.font.as_deref());
    let frame_pipeline = pipeline::FramePipeline::new(source, glyphs);

    let config = Arc::new(ArcSwap::from_pointee(config));

    // 6. Hot-reload de la config (thread interne notify)
    let _watcher = if cli.config.exists() {
        Some(hotreload::spawn_config_watcher(&cli.config, &config)?)
    } else {
        None
    };

    // 7. Sans terminal : capture / snapshot puis sortie
    if cli.headless {
        return headless::run(&cli, &config, frame_pipeline);
    }

    // 8. Terminal ratatui + boucle principale
    let terminal = ratatui::init();
    let mut app_instance = app::App::new(
        config,
        cli.config.clone(),
        frame_pipeline,
        app::CaptureSettings {
            format: cli.format,
            output: cli.output.clone(),
            secs: cli.capture_secs(),
        },
    );
    let result = app_instance.run(terminal);

    // 9. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

/// Config du fichier `--config`, ou les défauts s'il n'existe pas.
fn resolve_config(cli: &cli::Cli) -> Result<GlyphConfig> {
    if cli.config.exists() {
        gt_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(GlyphConfig::default())
    }
}
