//! Configuration management for the quasi-clique clusterer

/// Default configuration for loading graphs and writing reports
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Edge attribute read as the edge weight
    pub weight_key: String,

    /// Fall back to a numeric edge `label` when the weight attribute is absent
    pub label_weights: bool,

    /// Weight given to edges that carry no usable weight attribute
    pub default_weight: f64,

    /// Pretty-print the JSON report
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weight_key: "weight".to_string(),
            label_weights: true,
            default_weight: 1.0,
            pretty: true,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        weight_key: impl Into<String>,
        label_weights: bool,
        default_weight: f64,
        pretty: bool,
    ) -> Self {
        Self {
            weight_key: weight_key.into(),
            label_weights,
            default_weight,
            pretty,
        }
    }
}
