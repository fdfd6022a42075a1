use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use gt_core::config::{GlyphConfig, load_config};
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Recharge `path` et publie un nouveau snapshot.
///
/// Le mode d'entrée reste celui de la session (la source est choisie au
/// lancement). En cas d'erreur l'ancien snapshot reste en place.
///
/// # Errors
/// Returns the load error; the published snapshot is left untouched.
pub fn reload_into(path: &Path, config: &ArcSwap<GlyphConfig>) -> Result<()> {
    let mut fresh = load_config(path)?;
    let current = config.load();
    fresh.input_mode = current.input_mode;
    config.store(Arc::new(fresh));
    log::info!("Config rechargée depuis {}", path.display());
    Ok(())
}

/// Surveille le fichier de config et republie le snapshot à chaque écriture.
///
/// Le Watcher retourné doit rester vivant tant que l'app tourne.
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<GlyphConfig>>,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
            && let Err(e) = reload_into(&path, &config)
        {
            log::warn!("Erreur de rechargement config : {e:#}");
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
