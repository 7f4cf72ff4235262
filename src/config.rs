use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::confirmation::ConfirmationConfig;
use crate::error::Error;
use crate::filter::FilterConfig;
use crate::pipeline::PipelineConfig;

pub const DEFAULT_LABS: [&str; 5] = [
    "Python LAB",
    "NETWORK LAB",
    "LANGUAGE LAB",
    "MOCK LAB",
    "ILP LAB",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub confirmation: ConfirmationConfig,
    pub pipeline: PipelineConfig,
    /// Labels listed in every status report, even before their first session.
    pub labs: Vec<String>,
    pub default_lab: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            confirmation: ConfirmationConfig::default(),
            pipeline: PipelineConfig::default(),
            labs: DEFAULT_LABS.iter().map(|s| s.to_string()).collect(),
            default_lab: DEFAULT_LABS[0].to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.confirmation.threshold == 0 {
            return Err(Error::InvalidConfig("confirmation threshold must be at least 1".into()));
        }

        if self.confirmation.expiry == 0 {
            return Err(Error::InvalidConfig("expiry window must be at least 1".into()));
        }

        if !(self.filter.min_aspect_ratio <= self.filter.max_aspect_ratio) {
            return Err(Error::InvalidConfig(format!(
                "aspect ratio band [{}, {}] is empty",
                self.filter.min_aspect_ratio, self.filter.max_aspect_ratio
            )));
        }

        if !(self.filter.min_area >= 0.0) {
            return Err(Error::InvalidConfig("min_area must not be negative".into()));
        }

        if self.default_lab.is_empty() {
            return Err(Error::InvalidConfig("default_lab must not be empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.confirmation.threshold, 12);
        assert_eq!(config.confirmation.expiry, 16);
        assert_eq!(config.pipeline.warmup_frames, 4);
        assert_eq!(config.filter.min_area, 900.0);
        assert_eq!(config.labs.len(), 5);
        assert_eq!(config.default_lab, "Python LAB");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"confirmation":{"threshold":3},"filter":{"min_area":100.0}}"#)
                .unwrap();

        assert_eq!(config.confirmation.threshold, 3);
        assert_eq!(config.confirmation.expiry, 16);
        assert_eq!(config.filter.min_area, 100.0);
        assert_eq!(config.filter.max_aspect_ratio, 3.5);
        assert_eq!(config.default_lab, "Python LAB");
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.confirmation.threshold = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.filter.min_aspect_ratio = 4.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.default_lab.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("qcount-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"pipeline":{"warmup_frames":0},"labs":["A"],"default_lab":"A"}"#)
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.pipeline.warmup_frames, 0);
        assert_eq!(config.labs, vec!["A".to_string()]);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Config::from_file("/definitely/not/here.json"),
            Err(Error::Io(_))
        ));
    }
}
