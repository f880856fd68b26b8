// Utilities bucket setup
//
// Creates the per-account bucket that the CloudFormation stack reads the
// transformer package from, then uploads the package.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ProvisionError;

/// Object storage operations used by the setup flow
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create a bucket and return its location
    async fn create_bucket(&self, name: &str) -> Result<String, ProvisionError>;

    /// Package `source_dir` as a zip archive and store it under `key`
    async fn upload_archive(
        &self,
        source_dir: &Path,
        bucket: &str,
        key: &str,
    ) -> Result<(), ProvisionError>;
}

/// Bucket holding the solution's deployment resources
pub fn utils_bucket_name(account_id: &str, region: &str) -> String {
    format!("{}-{}-ses-blog-utils-bucket", account_id, region)
}

#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub account_id: String,
    pub region: String,
    pub source_dir: PathBuf,
    pub key: String,
}

impl SetupPlan {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            source_dir: PathBuf::from("../TransformationLambdaCode"),
            key: "TransformationLambdaCode.zip".to_string(),
        }
    }

    pub fn bucket_name(&self) -> String {
        utils_bucket_name(&self.account_id, &self.region)
    }

    fn validate(&self) -> Result<(), ProvisionError> {
        if self.account_id.is_empty() || !self.account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProvisionError::InvalidInput(format!(
                "account id must be numeric, got '{}'",
                self.account_id
            )));
        }
        if self.region.is_empty() {
            return Err(ProvisionError::InvalidInput("region is required".into()));
        }
        if self.key.is_empty() {
            return Err(ProvisionError::InvalidInput("object key is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub bucket: String,
    pub location: String,
    pub key: String,
}

/// Create the utilities bucket and upload the transformer package into it.
pub async fn run_setup<S: ObjectStorage + ?Sized>(
    storage: &S,
    plan: &SetupPlan,
) -> Result<SetupReport, ProvisionError> {
    plan.validate()?;
    info!(
        account_id = %plan.account_id,
        region = %plan.region,
        "Starting resource setup"
    );

    let bucket = plan.bucket_name();
    let location = storage.create_bucket(&bucket).await?;
    info!(bucket = %bucket, location = %location, "S3 bucket created");

    storage
        .upload_archive(&plan.source_dir, &bucket, &plan.key)
        .await?;
    info!(
        bucket = %bucket,
        key = %plan.key,
        source = %plan.source_dir.display(),
        "Transformer package uploaded"
    );
    info!("Next step: deploy the CloudFormation template");

    Ok(SetupReport {
        bucket,
        location,
        key: plan.key.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name() {
        assert_eq!(
            utils_bucket_name("123456789012", "eu-west-1"),
            "123456789012-eu-west-1-ses-blog-utils-bucket"
        );
    }

    #[test]
    fn test_plan_defaults() {
        let plan = SetupPlan::new("123456789012", "us-east-1");
        assert_eq!(plan.key, "TransformationLambdaCode.zip");
        assert_eq!(plan.source_dir, PathBuf::from("../TransformationLambdaCode"));
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_plan_validation() {
        assert!(SetupPlan::new("", "us-east-1").validate().is_err());
        assert!(SetupPlan::new("12345abc", "us-east-1").validate().is_err());
        assert!(SetupPlan::new("123456789012", "").validate().is_err());
    }
}
