//! Configuration snapshot (spec §6) and its text-file loader.
//!
//! Like the blocklist loader, a missing or partially-malformed config file
//! is not a startup error: every key that is absent or fails to parse falls
//! back to its documented default.

use std::fs;
use std::path::Path;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_THREADS: usize = 8;
const DEFAULT_CACHE_SIZE_MB: u64 = 200;
const DEFAULT_ELEMENT_SIZE_MB: u64 = 10;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub threads: usize,
    pub cache_capacity_bytes: u64,
    pub element_ceiling_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            threads: DEFAULT_THREADS,
            cache_capacity_bytes: DEFAULT_CACHE_SIZE_MB * MB,
            element_ceiling_bytes: DEFAULT_ELEMENT_SIZE_MB * MB,
        }
    }
}

impl Config {
    /// Parses `name = value` pairs, one per line; `#`-prefixed and blank
    /// lines are ignored. Unknown keys are ignored too, rather than
    /// rejected, since the config file is an external collaborator that may
    /// evolve independently of this binary.
    pub fn load(path: &Path) -> Self {
        let mut config = Config::default();
        let Ok(text) = fs::read_to_string(path) else {
            return config;
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "port" => {
                    if let Ok(v) = value.parse() {
                        config.port = v;
                    }
                }
                "threads" => {
                    if let Ok(v) = value.parse() {
                        config.threads = v;
                    }
                }
                "cache_size_mb" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.cache_capacity_bytes = v * MB;
                    }
                }
                "element_size_mb" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.element_ceiling_bytes = v * MB;
                    }
                }
                _ => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = Config::load(Path::new("/nonexistent/cacheproxy.conf"));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.cache_capacity_bytes, DEFAULT_CACHE_SIZE_MB * MB);
        assert_eq!(config.element_ceiling_bytes, DEFAULT_ELEMENT_SIZE_MB * MB);
    }

    #[test]
    fn parses_all_keys() {
        let dir = std::env::temp_dir().join(format!("cacheproxy-config-test-{}", std::process::id()));
        std::fs::write(
            &dir,
            "port = 9090\nthreads = 16\ncache_size_mb = 64\nelement_size_mb = 4\n# a comment\n",
        )
        .unwrap();

        let config = Config::load(&dir);
        assert_eq!(config.port, 9090);
        assert_eq!(config.threads, 16);
        assert_eq!(config.cache_capacity_bytes, 64 * MB);
        assert_eq!(config.element_ceiling_bytes, 4 * MB);
        std::fs::remove_file(&dir).ok();
    }

    #[test]
    fn ignores_unparsable_and_unknown_keys() {
        let dir = std::env::temp_dir().join(format!("cacheproxy-config-test2-{}", std::process::id()));
        std::fs::write(&dir, "port = not-a-number\nfavorite_color = blue\n").unwrap();

        let config = Config::load(&dir);
        assert_eq!(config.port, DEFAULT_PORT);
        std::fs::remove_file(&dir).ok();
    }
}
