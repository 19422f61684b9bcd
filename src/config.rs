use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use validator::{Validate, ValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "serverless.yml";
pub const DEFAULT_STAGE: &str = "dev";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Service name is missing or empty")]
    MissingServiceName,

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// `service:` accepts both the short and the object form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ServiceField {
    Name(String),
    Detailed { name: String },
}

impl ServiceField {
    pub fn name(&self) -> &str {
        match self {
            ServiceField::Name(name) => name,
            ServiceField::Detailed { name } => name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: Option<String>,
    pub stage: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomConfig {
    #[serde(rename = "resource-output-file")]
    pub resource_output_file: Option<String>,

    #[serde(rename = "resource-typings-file")]
    pub resource_typings_file: Option<String>,
}

/// The subset of `serverless.yml` this tool reads. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServiceConfig {
    #[validate(required, custom = "validate_service")]
    pub service: Option<ServiceField>,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[validate(custom = "validate_custom")]
    pub custom: Option<CustomConfig>,
}

impl ServiceConfig {
    pub fn service_name(&self) -> Option<&str> {
        return self.service.as_ref().map(ServiceField::name);
    }

    pub fn output_file(&self) -> Option<&str> {
        return self
            .custom
            .as_ref()
            .and_then(|custom| custom.resource_output_file.as_deref());
    }

    pub fn typings_file(&self) -> Option<&str> {
        return self
            .custom
            .as_ref()
            .and_then(|custom| custom.resource_typings_file.as_deref());
    }
}

/// Values the host supplies for one invocation.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub service_path: PathBuf,
    pub stage: Option<String>,
    pub service: ServiceConfig,
}

/// Options passed explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub stage: Option<String>,
    pub region: Option<String>,
}

pub fn parse(path: &Path) -> Result<ServiceConfig, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: ServiceConfig = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    match config.validate() {
        Ok(_) => (),
        Err(error) => return Err(Error::ValidationError(error.to_string())),
    }

    return Ok(config);
}

/// Reads the service configuration from `config_path`, or from
/// `serverless.yml` inside `service_path` when no path is given.
pub fn load(
    service_path: PathBuf,
    config_path: Option<PathBuf>,
    stage: Option<String>,
) -> Result<HostConfig, Error> {
    let config_path = config_path.unwrap_or_else(|| service_path.join(DEFAULT_CONFIG_FILE));
    let service = parse(&config_path)?;

    return Ok(HostConfig {
        service_path,
        stage,
        service,
    });
}

/// First non-empty stage among the option, the host config and the provider
/// default, falling back to `dev`.
pub fn resolve_stage(options: &Options, host_config: &HostConfig) -> String {
    let candidates = [
        options.stage.as_deref(),
        host_config.stage.as_deref(),
        host_config.service.provider.stage.as_deref(),
    ];

    return candidates
        .into_iter()
        .flatten()
        .find(|stage| !stage.is_empty())
        .unwrap_or(DEFAULT_STAGE)
        .to_string();
}

pub fn resolve_stack_name(service_name: Option<&str>, stage: &str) -> Result<String, Error> {
    match service_name {
        Some(name) if !name.trim().is_empty() => Ok(format!("{}-{}", name, stage)),
        _ => Err(Error::MissingServiceName),
    }
}

fn validate_service(service: &ServiceField) -> Result<(), ValidationError> {
    if service.name().trim().is_empty() {
        return Err(ValidationError::new("The service name must not be empty"));
    }

    return Ok(());
}

fn validate_custom(custom: &CustomConfig) -> Result<(), ValidationError> {
    let file_names = [
        custom.resource_output_file.as_deref(),
        custom.resource_typings_file.as_deref(),
    ];

    for file_name in file_names.into_iter().flatten() {
        if file_name.trim().is_empty() {
            return Err(ValidationError::new(
                "Resource file names must not be empty",
            ));
        }
        if Path::new(file_name).is_absolute() {
            return Err(ValidationError::new(
                "Resource file names have to be relative to the service path",
            ));
        }
    }

    return Ok(());
}
