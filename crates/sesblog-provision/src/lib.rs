//! Provisioning flows for the SES engagement analytics stack.
//!
//! Two one-off setup flows surround the record transformer:
//!
//! - [`storage`]: create the utilities bucket and upload the transformer's
//!   packaged code to it.
//! - [`dashboard`]: create the BI data source, dataset and dashboard, then
//!   wait for the dashboard to finish creating.
//!
//! [`replication`] copies each partitioned object the delivery stream lands
//! into a destination bucket.
//!
//! Remote calls sit behind the [`ObjectStorage`], [`DashboardApi`] and
//! [`ObjectCopier`] traits. This crate owns the orchestration around them.

pub mod dashboard;
pub mod error;
pub mod poll;
pub mod replication;
pub mod storage;

pub use dashboard::{
    dashboard_definition, data_source_arn, dataset_arn, provision_dashboard, DashboardApi,
    AvailabilityOption, DashboardCreation, DashboardPlan, DashboardPublishOptions,
    DashboardReport, DashboardRequest, DashboardStatus, DataSourceRequest, DatasetRequest,
    InputColumn, VisibilityOption,
};
pub use error::ProvisionError;
pub use poll::{wait_for_dashboard, PollConfig};
pub use replication::{
    decode_object_key, replicate_object, CopyRequest, ObjectCopier, ObjectCreatedEvent,
    ReplicationConfig, ReplicationOutcome,
};
pub use storage::{run_setup, utils_bucket_name, ObjectStorage, SetupPlan, SetupReport};
