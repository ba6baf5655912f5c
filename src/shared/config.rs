use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a materialized generation, in seconds.
    pub ttl_secs: u64,
    /// Upper bound on entries written per refresh run.
    pub generation_size_max: usize,
    /// Wall-clock budget for one refresh run, in seconds.
    pub refresh_timeout_secs: u64,
    /// How far back own/followed posts are considered, in days.
    pub lookback_days: u64,
    /// How far back discovery candidates are considered, in hours.
    pub discovery_window_hours: u64,
    /// Largest share of a generation the discovery slice may occupy.
    pub discovery_fraction_max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub half_life_hours: f64,
    pub own_post_multiplier: f64,
    pub followed_multiplier: f64,
    pub comment_weight: u64,
    pub share_weight: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/feedline.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            cache: CacheConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 1800, // 30 minutes
            generation_size_max: 500,
            refresh_timeout_secs: 5,
            lookback_days: 14,
            discovery_window_hours: 48,
            discovery_fraction_max: 0.3,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 12.0,
            own_post_multiplier: 1.5,
            followed_multiplier: 3.0,
            comment_weight: 2,
            share_weight: 3,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FEEDLINE_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_CACHE_TTL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.ttl_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_GENERATION_SIZE_MAX") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.generation_size_max = (value.max(1)) as usize;
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_REFRESH_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.refresh_timeout_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_LOOKBACK_DAYS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.lookback_days = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_DISCOVERY_WINDOW_HOURS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.discovery_window_hours = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_DISCOVERY_FRACTION_MAX") {
            if let Some(value) = parse_f64(&v) {
                cfg.cache.discovery_fraction_max = value.clamp(0.0, 0.99);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_HALF_LIFE_HOURS") {
            if let Some(value) = parse_f64(&v) {
                if value > 0.0 {
                    cfg.scoring.half_life_hours = value;
                }
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_OWN_POST_MULTIPLIER") {
            if let Some(value) = parse_f64(&v) {
                cfg.scoring.own_post_multiplier = value.max(0.0);
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_FOLLOWED_MULTIPLIER") {
            if let Some(value) = parse_f64(&v) {
                cfg.scoring.followed_multiplier = value.max(0.0);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.cache.ttl_secs == 0 {
            return Err("Cache ttl_secs must be greater than 0".to_string());
        }
        if self.cache.generation_size_max == 0 {
            return Err("Cache generation_size_max must be greater than 0".to_string());
        }
        if self.cache.refresh_timeout_secs == 0 {
            return Err("Cache refresh_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..1.0).contains(&self.cache.discovery_fraction_max) {
            return Err("Cache discovery_fraction_max must be in [0, 1)".to_string());
        }
        if self.scoring.half_life_hours <= 0.0 {
            return Err("Scoring half_life_hours must be positive".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = FeedConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cache.ttl_secs, 1800);
        assert_eq!(cfg.cache.generation_size_max, 500);
        assert!((cfg.scoring.followed_multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = FeedConfig::default();
        let json = serde_json::to_string(&cfg).expect("serialize");
        let parsed: FeedConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.cache.ttl_secs, cfg.cache.ttl_secs);
        assert_eq!(parsed.cache.generation_size_max, cfg.cache.generation_size_max);
        assert_eq!(parsed.database.url, cfg.database.url);
        assert!((parsed.scoring.half_life_hours - cfg.scoring.half_life_hours).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_bad_fraction() {
        let mut cfg = FeedConfig::default();
        cfg.cache.discovery_fraction_max = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut cfg = FeedConfig::default();
        cfg.cache.ttl_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_half_life() {
        let mut cfg = FeedConfig::default();
        cfg.scoring.half_life_hours = 0.0;
        assert!(cfg.validate().is_err());
    }
}
