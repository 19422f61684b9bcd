use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{self, HostConfig, Options};
use crate::resources::{self, DescribeStackResources};
use crate::writer;

pub const DEFAULT_FILENAME: &str = ".cfResources";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Resources(#[from] resources::Error),

    #[error(transparent)]
    Writer(#[from] writer::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub stack_name: String,
    pub path: PathBuf,
    pub resource_count: usize,
}

pub struct ResourceExporter<S> {
    options: Options,
    host_config: HostConfig,
    source: S,
}

impl<S: DescribeStackResources> ResourceExporter<S> {
    pub fn new(options: Options, host_config: HostConfig, source: S) -> Self {
        Self {
            options,
            host_config,
            source,
        }
    }

    pub fn stage(&self) -> String {
        return config::resolve_stage(&self.options, &self.host_config);
    }

    pub fn stack_name(&self) -> Result<String, config::Error> {
        return config::resolve_stack_name(
            self.host_config.service.service_name(),
            &self.stage(),
        );
    }

    pub fn output_path(&self) -> PathBuf {
        let file_name = self
            .host_config
            .service
            .output_file()
            .unwrap_or(DEFAULT_FILENAME);

        return self.host_config.service_path.join(file_name);
    }

    pub fn typings_path(&self) -> Option<PathBuf> {
        return self
            .host_config
            .service
            .typings_file()
            .map(|file_name| self.host_config.service_path.join(file_name));
    }

    pub async fn export_resources(&self) -> Result<ExportReport, Error> {
        let stack_name = self.stack_name()?;
        info!(stack_name = %stack_name, "Looking up CloudFormation resources");

        let descriptors = self.source.describe_stack_resources(&stack_name).await?;
        let resources = resources::to_resource_map(&descriptors);

        let path = self.output_path();
        info!(
            count = resources.len(),
            path = %path.display(),
            "Writing CloudFormation resources"
        );
        writer::write_json(&path, &resources)?;

        if let Some(typings_path) = self.typings_path() {
            debug!(path = %typings_path.display(), "Writing resource typings");
            writer::write_typings(&typings_path, &resources)?;
        }

        return Ok(ExportReport {
            stack_name,
            path,
            resource_count: resources.len(),
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use futures::future::{self, BoxFuture, FutureExt};
    use tempfile::tempdir;

    use super::*;
    use crate::config::{CustomConfig, ProviderConfig, ServiceConfig, ServiceField};
    use crate::resources::ResourceDescriptor;

    /// Answers every describe call with the same resources and records the
    /// requested stack names.
    pub(crate) struct FakeStack {
        resources: Vec<ResourceDescriptor>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl FakeStack {
        pub(crate) fn new(resources: &[(&str, &str)]) -> Self {
            Self {
                resources: resources
                    .iter()
                    .map(|(logical_id, physical_id)| ResourceDescriptor::new(*logical_id, *physical_id))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl DescribeStackResources for FakeStack {
        fn describe_stack_resources<'a>(
            &'a self,
            stack_name: &'a str,
        ) -> BoxFuture<'a, Result<Vec<ResourceDescriptor>, resources::Error>> {
            self.requested.lock().unwrap().push(stack_name.to_string());
            future::ready(Ok(self.resources.clone())).boxed()
        }
    }

    /// Fails every describe call as CloudFormation does for an unknown stack.
    struct MissingStack;

    impl DescribeStackResources for MissingStack {
        fn describe_stack_resources<'a>(
            &'a self,
            stack_name: &'a str,
        ) -> BoxFuture<'a, Result<Vec<ResourceDescriptor>, resources::Error>> {
            future::ready(Err(resources::Error::StackNotFound(stack_name.to_string()))).boxed()
        }
    }

    pub(crate) fn host_config(service_path: &Path, custom: Option<CustomConfig>) -> HostConfig {
        HostConfig {
            service_path: service_path.to_path_buf(),
            stage: None,
            service: ServiceConfig {
                service: Some(ServiceField::Name(String::from("a_service"))),
                provider: ProviderConfig::default(),
                custom,
            },
        }
    }

    pub(crate) fn options() -> Options {
        Options {
            stage: Some(String::from("from_option")),
            region: None,
        }
    }

    #[tokio::test]
    async fn fetches_and_saves_empty_file() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(options(), host_config(dir.path(), None), FakeStack::new(&[]));

        let report = exporter.export_resources().await.unwrap();

        assert_eq!("a_service-from_option", report.stack_name);
        assert_eq!(dir.path().join(DEFAULT_FILENAME), report.path);
        assert_eq!(0, report.resource_count);
        assert_eq!("{}", fs::read_to_string(&report.path).unwrap());
        assert_eq!(
            vec![String::from("a_service-from_option")],
            *exporter.source.requested.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn fetches_and_saves_mapped_file() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(
            options(),
            host_config(dir.path(), None),
            FakeStack::new(&[("a", "1"), ("b", "2"), ("c", "3")]),
        );

        let report = exporter.export_resources().await.unwrap();

        let contents = fs::read_to_string(&report.path).unwrap();
        assert_eq!(r#"{"a":"1","b":"2","c":"3"}"#, contents);
        assert_eq!(3, report.resource_count);
    }

    #[tokio::test]
    async fn uses_custom_output_file() {
        let dir = tempdir().unwrap();
        let custom = CustomConfig {
            resource_output_file: Some(String::from("resources.json")),
            resource_typings_file: None,
        };
        let exporter = ResourceExporter::new(
            options(),
            host_config(dir.path(), Some(custom)),
            FakeStack::new(&[("a", "1")]),
        );

        let report = exporter.export_resources().await.unwrap();

        assert_eq!(dir.path().join("resources.json"), report.path);
        assert!(!dir.path().join(DEFAULT_FILENAME).exists());
    }

    #[tokio::test]
    async fn writes_typings_when_configured() {
        let dir = tempdir().unwrap();
        let custom = CustomConfig {
            resource_output_file: None,
            resource_typings_file: Some(String::from("resources.d.ts")),
        };
        let exporter = ResourceExporter::new(
            options(),
            host_config(dir.path(), Some(custom)),
            FakeStack::new(&[("Table", "t-1")]),
        );

        exporter.export_resources().await.unwrap();

        let typings = fs::read_to_string(dir.path().join("resources.d.ts")).unwrap();
        assert!(typings.contains("Table: string;"));
        assert!(dir.path().join(DEFAULT_FILENAME).exists());
    }

    #[tokio::test]
    async fn repeated_exports_are_identical() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(
            options(),
            host_config(dir.path(), None),
            FakeStack::new(&[("c", "3"), ("a", "1"), ("b", "2")]),
        );

        let first = exporter.export_resources().await.unwrap();
        let first_contents = fs::read(&first.path).unwrap();
        let second = exporter.export_resources().await.unwrap();
        let second_contents = fs::read(&second.path).unwrap();

        assert_eq!(first_contents, second_contents);
    }

    #[tokio::test]
    async fn missing_service_name_is_rejected() {
        let dir = tempdir().unwrap();
        let mut host_config = host_config(dir.path(), None);
        host_config.service.service = None;
        let exporter = ResourceExporter::new(options(), host_config, FakeStack::new(&[("a", "1")]));

        match exporter.export_resources().await.err().unwrap() {
            Error::Config(config::Error::MissingServiceName) => {}
            other => panic!("Expected `MissingServiceName` error, got {other}"),
        }
        assert!(exporter.source.requested.lock().unwrap().is_empty());
        assert!(!dir.path().join(DEFAULT_FILENAME).exists());
    }

    #[tokio::test]
    async fn describe_failures_propagate() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(options(), host_config(dir.path(), None), MissingStack);

        match exporter.export_resources().await.err().unwrap() {
            Error::Resources(resources::Error::StackNotFound(stack_name)) => {
                assert_eq!("a_service-from_option", stack_name)
            }
            other => panic!("Expected `StackNotFound` error, got {other}"),
        }
        assert!(!dir.path().join(DEFAULT_FILENAME).exists());
    }

    #[tokio::test]
    async fn duplicate_logical_ids_are_counted_once() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(
            options(),
            host_config(dir.path(), None),
            FakeStack::new(&[("a", "1"), ("a", "2"), ("b", "3")]),
        );

        let report = exporter.export_resources().await.unwrap();

        assert_eq!(2, report.resource_count);
        assert_eq!(r#"{"a":"2","b":"3"}"#, fs::read_to_string(&report.path).unwrap());
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let dir = tempdir().unwrap();
        let exporter = ResourceExporter::new(
            options(),
            host_config(&dir.path().join("missing"), None),
            FakeStack::new(&[("a", "1")]),
        );

        match exporter.export_resources().await.err().unwrap() {
            Error::Writer(writer::Error::Write { .. }) => {}
            other => panic!("Expected `Write` error, got {other}"),
        }
    }

    #[test]
    fn resolves_stack_name_from_default_stage() {
        let dir = tempdir().unwrap();
        let exporter =
            ResourceExporter::new(Options::default(), host_config(dir.path(), None), FakeStack::new(&[]));

        assert_eq!("dev", exporter.stage());
        assert_eq!("a_service-dev", exporter.stack_name().unwrap());
    }
}
