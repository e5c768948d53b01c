//! Tag, message and sampling filters applied before entries are built

use crate::{
    config::{FilterConfig, PerformanceConfig},
    Error, Result,
};
use regex::Regex;

/// Compiled form of [`FilterConfig`]
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    include_tags: Vec<String>,
    exclude_tags: Vec<String>,
    include_patterns: Vec<Regex>,
    exclude_patterns: Vec<Regex>,
}

impl EntryFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            include_tags: config.include_tags.clone(),
            exclude_tags: config.exclude_tags.clone(),
            include_patterns: compile(&config.include_patterns)?,
            exclude_patterns: compile(&config.exclude_patterns)?,
        })
    }

    /// Whether a message with this tag should be logged
    pub fn allows(&self, tag: Option<&str>, message: &str) -> bool {
        if !self.include_tags.is_empty() {
            match tag {
                Some(tag) if self.include_tags.iter().any(|t| t == tag) => {}
                _ => return false,
            }
        }

        if let Some(tag) = tag {
            if self.exclude_tags.iter().any(|t| t == tag) {
                return false;
            }
        }

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| p.is_match(message))
        {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| p.is_match(message))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| Error::Config {
                message: format!("Invalid filter pattern '{}': {}", pattern, e),
            })
        })
        .collect()
}

/// Probabilistic sampling gate
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    rate: Option<f64>,
}

impl Sampler {
    pub fn new(config: &PerformanceConfig) -> Self {
        Self {
            rate: config
                .enable_sampling
                .then_some(config.sampling_rate.clamp(0.0, 1.0)),
        }
    }

    /// Keep everything
    pub fn disabled() -> Self {
        Self { rate: None }
    }

    pub fn keep(&self) -> bool {
        match self.rate {
            None => true,
            Some(rate) if rate >= 1.0 => true,
            Some(rate) if rate <= 0.0 => false,
            Some(rate) => rand::random::<f64>() < rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(config: FilterConfig) -> EntryFilter {
        EntryFilter::new(&config).unwrap()
    }

    #[test]
    fn test_default_filter_allows_everything() {
        let filter = filter(FilterConfig::default());
        assert!(filter.allows(None, "anything"));
        assert!(filter.allows(Some("auth"), "anything"));
    }

    #[test]
    fn test_include_tags_require_matching_tag() {
        let filter = filter(FilterConfig {
            include_tags: vec!["auth".to_string(), "api".to_string()],
            ..FilterConfig::default()
        });

        assert!(filter.allows(Some("auth"), "login"));
        assert!(!filter.allows(Some("game"), "move"));
        assert!(!filter.allows(None, "untagged"));
    }

    #[test]
    fn test_exclude_tags() {
        let filter = filter(FilterConfig {
            exclude_tags: vec!["noise".to_string()],
            ..FilterConfig::default()
        });

        assert!(!filter.allows(Some("noise"), "tick"));
        assert!(filter.allows(None, "tick"));
    }

    #[test]
    fn test_message_patterns() {
        let filter = filter(FilterConfig {
            include_patterns: vec!["(?i)score".to_string()],
            exclude_patterns: vec!["heartbeat".to_string()],
            ..FilterConfig::default()
        });

        assert!(filter.allows(None, "Score saved"));
        assert!(!filter.allows(None, "score heartbeat"));
        assert!(!filter.allows(None, "level loaded"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = EntryFilter::new(&FilterConfig {
            exclude_patterns: vec!["[".to_string()],
            ..FilterConfig::default()
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_sampler_extremes() {
        let mut config = PerformanceConfig {
            enable_sampling: true,
            sampling_rate: 0.0,
            ..PerformanceConfig::default()
        };
        assert!((0..100).all(|_| !Sampler::new(&config).keep()));

        config.sampling_rate = 1.0;
        assert!((0..100).all(|_| Sampler::new(&config).keep()));

        config.enable_sampling = false;
        config.sampling_rate = 0.0;
        assert!(Sampler::new(&config).keep());
        assert!(Sampler::disabled().keep());
    }
}
