use std::collections::BTreeMap;

use aws_config::meta::region::RegionProviderChain;
use aws_sdk_cloudformation::model::StackResource;
use aws_types::region::Region;
use futures::future::{BoxFuture, FutureExt};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Describing resources of stack {stack_name} failed: {source}")]
    DescribeFailed {
        stack_name: String,
        #[source]
        source: aws_sdk_cloudformation::Error,
    },

    #[error("Stack {0} not found")]
    StackNotFound(String),
}

impl Error {
    fn from_describe(stack_name: &str, source: aws_sdk_cloudformation::Error) -> Self {
        if is_missing_stack(&source.to_string()) {
            return Error::StackNotFound(stack_name.to_string());
        }

        return Error::DescribeFailed {
            stack_name: stack_name.to_string(),
            source,
        };
    }
}

/// CloudFormation reports an unknown stack as a `ValidationError` whose
/// message ends in "does not exist".
fn is_missing_stack(message: &str) -> bool {
    return message.contains("does not exist");
}

/// Logical to physical id mapping. Ordered so the written file is stable.
pub type ResourceMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub logical_id: String,
    pub physical_id: String,
}

impl ResourceDescriptor {
    pub fn new(logical_id: impl Into<String>, physical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            physical_id: physical_id.into(),
        }
    }

    /// Resources still being created have no physical id yet and are skipped.
    fn from_stack_resource(resource: &StackResource) -> Option<Self> {
        let logical_id = resource.logical_resource_id()?;
        let physical_id = resource.physical_resource_id()?;

        return Some(Self::new(logical_id, physical_id));
    }
}

/// Source of a stack's resource inventory.
pub trait DescribeStackResources {
    fn describe_stack_resources<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceDescriptor>, Error>>;
}

pub struct CloudFormation {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormation {
    /// Uses `region` when given, otherwise the default region provider chain.
    pub async fn new(region: Option<String>) -> Self {
        let region_provider =
            RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();

        let sdk_config = aws_config::from_env().region(region_provider).load().await;
        let client = aws_sdk_cloudformation::Client::new(&sdk_config);

        return Self { client };
    }
}

impl DescribeStackResources for CloudFormation {
    fn describe_stack_resources<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceDescriptor>, Error>> {
        async move {
            let result = self
                .client
                .describe_stack_resources()
                .stack_name(stack_name)
                .send()
                .await;

            let result = match result {
                Ok(data) => data,
                Err(err) => {
                    return Err(Error::from_describe(
                        stack_name,
                        aws_sdk_cloudformation::Error::from(err),
                    ))
                }
            };

            let descriptors = result
                .stack_resources()
                .unwrap_or_else(|| &[])
                .iter()
                .filter_map(ResourceDescriptor::from_stack_resource)
                .collect();

            return Ok(descriptors);
        }
        .boxed()
    }
}

/// Folds descriptors into a map; a repeated logical id keeps the last value.
pub fn to_resource_map(descriptors: &[ResourceDescriptor]) -> ResourceMap {
    let init = ResourceMap::new();
    return descriptors.iter().fold(init, |mut acc, descriptor| {
        acc.insert(
            descriptor.logical_id.clone(),
            descriptor.physical_id.clone(),
        );
        return acc;
    });
}
