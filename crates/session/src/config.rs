//! Session configuration.

use dynamics::CartPoleParams;
use serde::Deserialize;

/// Tunable session parameters, loadable from JSON.
///
/// The tensor dimensions must match the models the runtime hosts; the
/// defaults match the shipped model set. `learned` holds the constants
/// driving the reduced-state track.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub latent_dim: usize,
    pub num_layers: usize,
    pub hidden_dim: usize,
    pub learned: CartPoleParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            latent_dim: model::LATENT_DIM,
            num_layers: model::NUM_LAYERS,
            hidden_dim: model::HIDDEN_DIM,
            learned: CartPoleParams::learned(),
        }
    }
}

impl SessionConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_model_set() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.latent_dim, 16);
        assert_eq!(cfg.num_layers, 2);
        assert_eq!(cfg.hidden_dim, 128);
        assert!(cfg.learned.force_mag > 10.0);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg =
            SessionConfig::from_json(r#"{"learned": {"gravity": 9.8, "cart_mass": 1.1, "pole_mass": 0.1, "half_length": 0.5, "force_mag": 9.5, "tau": 0.02}}"#)
                .unwrap();
        assert_eq!(cfg.latent_dim, 16);
        assert!((cfg.learned.force_mag - 9.5).abs() < 1e-6);
        assert!((cfg.learned.cart_mass - 1.1).abs() < 1e-6);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SessionConfig::from_json("{not json").is_err());
    }
}
