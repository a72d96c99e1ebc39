use config::{Config, ConfigError, FileFormat};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Pipeline settings, loaded once per run and passed by reference to every stage.
///
/// The on-disk format is the INI layout of `dl.cfg`. Section and key names are
/// case-insensitive; the `ouput_path` section keeps its historical spelling.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub default: Credentials,
    pub path: InputPaths,
    #[serde(rename = "ouput_path")]
    pub output_path: OutputPaths,
}

#[derive(Deserialize, Clone)]
pub struct Credentials {
    #[serde(alias = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: String,
    #[serde(alias = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: String,
    #[serde(default = "default_region", alias = "AWS_REGION")]
    pub aws_region: String,
    #[serde(default, alias = "AWS_ENDPOINT")]
    pub aws_endpoint: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint", &self.aws_endpoint)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputPaths {
    #[serde(default = "default_labels_path", alias = "LABELS_PATH")]
    pub labels_path: String,
    #[serde(alias = "AIRPORTS_PATH")]
    pub airports_path: String,
    #[serde(alias = "STATES_PATH")]
    pub states_path: String,
    #[serde(alias = "COUNTRIES_PATH")]
    pub countries_path: String,
    #[serde(alias = "IMMIGRANTS_PATH")]
    pub immigrants_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputPaths {
    #[serde(alias = "AIRPORTS_OUTPATH")]
    pub airports_outpath: String,
    #[serde(alias = "STATES_OUTPATH")]
    pub states_outpath: String,
    #[serde(alias = "COUNTRIES_OUTPATH")]
    pub countries_outpath: String,
    #[serde(alias = "ADMISSIONS_OUTPATH")]
    pub admissions_outpath: String,
    #[serde(alias = "TIME_OUTPATH")]
    pub time_outpath: String,
    #[serde(alias = "FACT_DATA_OUTPATH")]
    pub fact_data_outpath: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_labels_path() -> String {
    "I94_SAS_Labels_Descriptions.SAS".to_string()
}

impl Settings {
    /// Loads settings from an INI file, then applies `ETL_<SECTION>__<KEY>` overrides.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::new(path, FileFormat::Ini))
            .add_source(
                config::Environment::with_prefix("ETL")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings = Self::deserialize_from(builder.build()?)?;
        debug!(config = path, "Loaded pipeline settings");
        Ok(settings)
    }

    /// Parses settings from INI text without consulting the environment.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::from_str(contents, FileFormat::Ini))
            .build()?;
        Self::deserialize_from(config)
    }

    fn deserialize_from(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        debug!(
            inputs = ?settings.path,
            outputs = ?settings.output_path,
            "Parsed pipeline locations"
        );
        Ok(settings)
    }

    /// Every dataset location named in the settings, inputs first.
    pub fn locations(&self) -> Vec<&str> {
        let path = &self.path;
        let out = &self.output_path;
        vec![
            &path.labels_path,
            &path.airports_path,
            &path.states_path,
            &path.countries_path,
            &path.immigrants_path,
            &out.airports_outpath,
            &out.states_outpath,
            &out.countries_outpath,
            &out.admissions_outpath,
            &out.time_outpath,
            &out.fact_data_outpath,
        ]
    }
}
