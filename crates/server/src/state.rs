use driveseed_core::{Config, ConversionService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    conversions: ConversionService,
}

impl AppState {
    pub fn new(config: Config, conversions: ConversionService) -> Self {
        Self {
            config,
            conversions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn conversions(&self) -> &ConversionService {
        &self.conversions
    }
}
