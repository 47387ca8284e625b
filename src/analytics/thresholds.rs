//! Heuristic thresholds.

use serde::{Deserialize, Serialize};

/// Every fixed number the analytics heuristics use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsThresholds {
    /// Complexity at which the normalized complexity metric reaches 1.
    pub complexity_scale: f64,
    /// Lines at which the normalized size metric reaches 1.
    pub lines_scale: f64,
    /// Bytes at which the normalized size metric reaches 1.
    pub bytes_scale: f64,
    /// Modifications at which the normalized change metric reaches 1.
    pub changes_scale: f64,
    /// Dependencies at which the normalized dependency metric reaches 1.
    pub dependencies_scale: f64,
    /// Weight of the reason's own metric in a hotspot score.
    pub primary_weight: f64,
    /// Weight of the mean of all metrics in a hotspot score.
    pub mean_weight: f64,

    pub critical_score: f64,
    pub high_score: f64,
    pub medium_score: f64,

    pub long_method_complexity: u32,
    pub long_method_params: usize,
    pub large_class_methods: usize,
    pub complex_conditional_complexity: u32,
    /// Ratio over a smell threshold that makes it major.
    pub major_multiple: f64,
    /// Ratio over a smell threshold that makes it critical.
    pub critical_multiple: f64,

    pub god_class_methods: usize,
    pub god_class_properties: usize,
    pub long_parameter_list: usize,
    /// Create/make functions needed to call a scope a factory.
    pub factory_functions: usize,

    /// Points kept per path.
    pub history_capacity: usize,
    pub max_recommendations: usize,
    pub max_cycles: usize,
}

impl Default for AnalyticsThresholds {
    fn default() -> Self {
        Self {
            complexity_scale: 20.0,
            lines_scale: 500.0,
            bytes_scale: 50_000.0,
            changes_scale: 10.0,
            dependencies_scale: 15.0,
            primary_weight: 0.75,
            mean_weight: 0.25,
            critical_score: 4.0,
            high_score: 2.5,
            medium_score: 1.5,
            long_method_complexity: 10,
            long_method_params: 5,
            large_class_methods: 15,
            complex_conditional_complexity: 7,
            major_multiple: 1.5,
            critical_multiple: 2.0,
            god_class_methods: 20,
            god_class_properties: 10,
            long_parameter_list: 7,
            factory_functions: 2,
            history_capacity: 1000,
            max_recommendations: 5,
            max_cycles: 100,
        }
    }
}
