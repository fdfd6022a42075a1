use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// A step table was requested for an empty step list.
    #[error("La liste de steps est vide")]
    EmptySteps,

    /// Unknown style or canvas preset name.
    #[error("Preset inconnu : {name}")]
    UnknownPreset {
        /// The requested preset name.
        name: String,
    },
}
