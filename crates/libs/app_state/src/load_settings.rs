use crate::{AppSettings, RawSettings};
use color_eyre::eyre::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Loads settings from a YAML file, overridden by `APP__`-prefixed environment variables.
///
/// `APP__LANGUAGE_MODEL__BASE_URL=http://gpu-box:8080` overrides `language_model.base_url`.
pub fn load_app_settings(config_path: &Path) -> Result<AppSettings> {
    // Load .env first so its values take part in the environment override.
    dotenv::from_path(".env").ok();
    let config_path = config_path
        .canonicalize()
        .wrap_err_with(|| format!("settings file not found: {}", config_path.display()))?;
    debug!("Loading settings from {}", config_path.display());

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    AppSettings::try_from(raw_settings)
}
