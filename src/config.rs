use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const VACCINATIONS_URL: &str =
    "https://opendata.ecdc.europa.eu/covid19/vaccine_tracker/csv/data.csv";
pub const COUNTRIES_URL: &str = "https://gist.githubusercontent.com/radcliff/f09c0f88344a7fcef373/raw/2753c482ad091c54b1822288ad2e4811c021d8ec/wikipedia-iso-country-codes.csv";
pub const VARIANTS_URL: &str = "https://opendata.ecdc.europa.eu/covid19/virusvariant/csv/data.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A remote CSV resource and the local file it is cached in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Source {
    pub url: String,
    pub file_name: String,
}

impl Source {
    pub fn new(url: &str, file_name: &str) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Sources {
    pub vaccinations: Source,
    pub countries: Source,
    pub variants: Source,
}

impl Sources {
    /// All sources in fetch order.
    pub fn all(&self) -> [&Source; 3] {
        [&self.vaccinations, &self.countries, &self.variants]
    }
}

impl Default for Sources {
    fn default() -> Self {
        Sources {
            vaccinations: Source::new(VACCINATIONS_URL, "EU Vaccinations.csv"),
            countries: Source::new(COUNTRIES_URL, "country_codes.csv"),
            variants: Source::new(VARIANTS_URL, "EU Variants.csv"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory the downloaded CSV files are cached in.
    pub data_dir: PathBuf,
    /// Directory for exported views, the run summary and chart images.
    pub output_dir: PathBuf,
    /// Download the sources concurrently instead of one after another.
    pub parallel_fetch: bool,
    pub chart_width: u32,
    pub chart_height: u32,
    pub sources: Sources,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("charts"),
            parallel_fetch: false,
            chart_width: 1280,
            chart_height: 800,
            sources: Sources::default(),
        }
    }
}

impl Config {
    /// Read a config from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            output_dir = "out"
            parallel_fetch = true

            [sources.countries]
            url = "http://localhost/codes.csv"
            file_name = "codes.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.parallel_fetch);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.chart_width, 1280);
        assert_eq!(config.sources.countries.file_name, "codes.csv");
        assert_eq!(config.sources.vaccinations.url, VACCINATIONS_URL);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "chart_width = \"wide\"").unwrap();
        assert!(matches!(
            Config::from_toml_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_toml_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
