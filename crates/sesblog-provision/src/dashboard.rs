// BI dashboard provisioning
//
// Creates an Athena-backed data source, a direct-query dataset over the
// partitioned SES events table, and a dashboard built from an exported
// definition document. Dashboard creation is asynchronous and is awaited with
// the bounded poller in `poll`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::info;

use crate::error::ProvisionError;
use crate::poll::{wait_for_dashboard, PollConfig};

const DATA_SOURCE_ACTIONS: &[&str] = &[
    "quicksight:UpdateDataSourcePermissions",
    "quicksight:DescribeDataSource",
    "quicksight:DescribeDataSourcePermissions",
    "quicksight:PassDataSource",
    "quicksight:UpdateDataSource",
    "quicksight:DeleteDataSource",
];

const DATASET_ACTIONS: &[&str] = &[
    "quicksight:UpdateDataSetPermissions",
    "quicksight:DescribeDataSet",
    "quicksight:DescribeDataSetPermissions",
    "quicksight:PassDataSet",
    "quicksight:DescribeIngestion",
    "quicksight:ListIngestions",
    "quicksight:UpdateDataSet",
    "quicksight:DeleteDataSet",
    "quicksight:CreateIngestion",
    "quicksight:CancelIngestion",
];

const DASHBOARD_ACTIONS: &[&str] = &[
    "quicksight:DescribeDashboard",
    "quicksight:ListDashboardVersions",
    "quicksight:UpdateDashboardPermissions",
    "quicksight:QueryDashboard",
    "quicksight:UpdateDashboard",
    "quicksight:DeleteDashboard",
    "quicksight:DescribeDashboardPermissions",
    "quicksight:UpdateDashboardPublishedVersion",
];

/// Columns of the partitioned SES events table, as named by the Glue crawler
const SES_EVENT_COLUMNS: &[(&str, &str)] = &[
    ("bouncetype", "STRING"),
    ("link", "STRING"),
    ("complaintfeedbacktype", "STRING"),
    ("delaytype", "STRING"),
    ("errormesage", "STRING"),
    ("expirationtime", "STRING"),
    ("feedbackid", "STRING"),
    ("processingtimemillis", "INTEGER"),
    ("eventtype", "STRING"),
    ("sender", "STRING"),
    ("subject", "STRING"),
    ("recipientmail", "STRING"),
    ("recipientevent", "STRING"),
    ("mailrecipientdomain", "STRING"),
    ("messageid", "STRING"),
    ("timestamp", "STRING"),
    ("ipaddress", "STRING"),
    ("reason", "STRING"),
    ("sesoutgoingip", "STRING"),
    ("sesourceip", "STRING"),
    ("templatename", "STRING"),
    ("useragent", "STRING"),
    ("year", "STRING"),
    ("month", "STRING"),
    ("day", "STRING"),
    ("hour", "STRING"),
];

/// String columns cast to DATETIME in the dataset's logical table
const DATETIME_COLUMNS: &[&str] = &["expirationtime", "timestamp"];
const DATETIME_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ss.SSSSZ";

const DEFAULT_THEME_ARN: &str = "arn:aws:quicksight::aws:theme/MIDNIGHT";

/// Dashboard version status as reported by the BI service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardStatus {
    CreationInProgress,
    CreationSuccessful,
    CreationFailed,
    UpdateInProgress,
    UpdateSuccessful,
    UpdateFailed,
    Deleted,
    Other(String),
}

impl DashboardStatus {
    pub fn from_api(value: &str) -> Self {
        match value {
            "CREATION_IN_PROGRESS" => Self::CreationInProgress,
            "CREATION_SUCCESSFUL" => Self::CreationSuccessful,
            "CREATION_FAILED" => Self::CreationFailed,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_SUCCESSFUL" => Self::UpdateSuccessful,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "DELETED" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreationInProgress => "CREATION_IN_PROGRESS",
            Self::CreationSuccessful => "CREATION_SUCCESSFUL",
            Self::CreationFailed => "CREATION_FAILED",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateSuccessful => "UPDATE_SUCCESSFUL",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::Deleted => "DELETED",
            Self::Other(other) => other,
        }
    }

    /// A newly created dashboard is only usable once creation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CreationSuccessful)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::CreationInProgress)
    }

    /// Any status other than pending ends the wait
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for DashboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputColumn {
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceRequest {
    pub aws_account_id: String,
    pub data_source_id: String,
    pub name: String,
    pub work_group: String,
    pub principal: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetRequest {
    pub aws_account_id: String,
    pub data_set_id: String,
    pub name: String,
    pub data_source_arn: String,
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub input_columns: Vec<InputColumn>,
    pub datetime_columns: Vec<String>,
    pub datetime_format: String,
    pub import_mode: String,
    pub principal: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardRequest {
    pub aws_account_id: String,
    pub dashboard_id: String,
    pub name: String,
    pub principal: String,
    pub actions: Vec<String>,
    pub version_description: String,
    pub dashboard_publish_options: DashboardPublishOptions,
    pub theme_arn: String,
    pub definition: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailabilityOption {
    pub availability_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisibilityOption {
    pub visibility_state: String,
}

/// Viewer capabilities of the published dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardPublishOptions {
    pub ad_hoc_filtering_option: AvailabilityOption,
    #[serde(rename = "ExportToCSVOption")]
    pub export_to_csv_option: AvailabilityOption,
    pub sheet_controls_option: VisibilityOption,
}

impl Default for DashboardPublishOptions {
    /// Ad-hoc filtering off, CSV export on, sheet controls expanded
    fn default() -> Self {
        Self {
            ad_hoc_filtering_option: AvailabilityOption {
                availability_status: "DISABLED".to_string(),
            },
            export_to_csv_option: AvailabilityOption {
                availability_status: "ENABLED".to_string(),
            },
            sheet_controls_option: VisibilityOption {
                visibility_state: "EXPANDED".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardCreation {
    pub arn: String,
    pub status: DashboardStatus,
}

/// BI service operations used by the dashboard flow
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// ARNs of users in `namespace`, in the order the service lists them
    async fn list_users(
        &self,
        account_id: &str,
        namespace: &str,
    ) -> Result<Vec<String>, ProvisionError>;

    async fn create_data_source(&self, request: &DataSourceRequest)
        -> Result<(), ProvisionError>;

    async fn create_dataset(&self, request: &DatasetRequest) -> Result<(), ProvisionError>;

    async fn create_dashboard(
        &self,
        request: &DashboardRequest,
    ) -> Result<DashboardCreation, ProvisionError>;

    async fn describe_dashboard_status(
        &self,
        account_id: &str,
        dashboard_id: &str,
    ) -> Result<DashboardStatus, ProvisionError>;
}

/// Identifiers and names for the resources the flow creates
#[derive(Debug, Clone)]
pub struct DashboardPlan {
    pub account_id: String,
    pub region: String,
    pub namespace: String,
    pub data_source_id: String,
    pub data_source_name: String,
    pub athena_workgroup: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub dashboard_id: String,
    pub dashboard_name: String,
}

impl DashboardPlan {
    /// Default resource names; the dataset id is a fresh UUID
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            namespace: "default".to_string(),
            data_source_id: "AthenaDataSource".to_string(),
            data_source_name: "Athena Data Source".to_string(),
            athena_workgroup: "SesAthenaWorkgroup".to_string(),
            dataset_id: uuid::Uuid::new_v4().to_string(),
            dataset_name: "partitioned".to_string(),
            dashboard_id: "MySESLogDashboard".to_string(),
            dashboard_name: "MySESLogDashboard".to_string(),
        }
    }

    fn data_source_request(&self, principal: &str) -> DataSourceRequest {
        DataSourceRequest {
            aws_account_id: self.account_id.clone(),
            data_source_id: self.data_source_id.clone(),
            name: self.data_source_name.clone(),
            work_group: self.athena_workgroup.clone(),
            principal: principal.to_string(),
            actions: to_strings(DATA_SOURCE_ACTIONS),
        }
    }

    fn dataset_request(&self, principal: &str) -> DatasetRequest {
        DatasetRequest {
            aws_account_id: self.account_id.clone(),
            data_set_id: self.dataset_id.clone(),
            name: self.dataset_name.clone(),
            data_source_arn: data_source_arn(&self.region, &self.account_id, &self.data_source_id),
            catalog: "AwsDataCatalog".to_string(),
            schema: "ses_event_data_database".to_string(),
            table: "partitioned".to_string(),
            input_columns: SES_EVENT_COLUMNS
                .iter()
                .map(|(name, column_type)| InputColumn {
                    name: name.to_string(),
                    column_type: column_type.to_string(),
                })
                .collect(),
            datetime_columns: to_strings(DATETIME_COLUMNS),
            datetime_format: DATETIME_FORMAT.to_string(),
            import_mode: "DIRECT_QUERY".to_string(),
            principal: principal.to_string(),
            actions: to_strings(DATASET_ACTIONS),
        }
    }

    fn dashboard_request(&self, principal: &str, definition: JsonValue) -> DashboardRequest {
        DashboardRequest {
            aws_account_id: self.account_id.clone(),
            dashboard_id: self.dashboard_id.clone(),
            name: self.dashboard_name.clone(),
            principal: principal.to_string(),
            actions: to_strings(DASHBOARD_ACTIONS),
            version_description: "1".to_string(),
            dashboard_publish_options: DashboardPublishOptions::default(),
            theme_arn: DEFAULT_THEME_ARN.to_string(),
            definition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardReport {
    pub user_arn: String,
    pub dataset_id: String,
    pub dashboard_arn: String,
    pub status: DashboardStatus,
}

pub fn data_source_arn(region: &str, account_id: &str, data_source_id: &str) -> String {
    format!(
        "arn:aws:quicksight:{}:{}:datasource/{}",
        region, account_id, data_source_id
    )
}

pub fn dataset_arn(region: &str, account_id: &str, dataset_id: &str) -> String {
    format!(
        "arn:aws:quicksight:{}:{}:dataset/{}",
        region, account_id, dataset_id
    )
}

/// Point an exported dashboard definition at the dataset created by this flow.
///
/// Sets `DataSetIdentifierDeclarations[0].DataSetArn`.
pub fn dashboard_definition(
    mut document: JsonValue,
    region: &str,
    account_id: &str,
    dataset_id: &str,
) -> Result<JsonValue, ProvisionError> {
    let declaration = document
        .get_mut("DataSetIdentifierDeclarations")
        .and_then(JsonValue::as_array_mut)
        .and_then(|declarations| declarations.first_mut())
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| {
            ProvisionError::InvalidDefinition(
                "missing DataSetIdentifierDeclarations[0] object".to_string(),
            )
        })?;

    declaration.insert(
        "DataSetArn".to_string(),
        JsonValue::String(dataset_arn(region, account_id, dataset_id)),
    );
    Ok(document)
}

/// Create data source, dataset and dashboard, waiting for the dashboard.
///
/// The first user listed in the plan's namespace is granted permissions on
/// every resource.
pub async fn provision_dashboard<A: DashboardApi + ?Sized>(
    api: &A,
    plan: &DashboardPlan,
    definition: JsonValue,
    poll: &PollConfig,
) -> Result<DashboardReport, ProvisionError> {
    info!(
        account_id = %plan.account_id,
        region = %plan.region,
        "Provisioning dashboard resources"
    );

    let definition = dashboard_definition(
        definition,
        &plan.region,
        &plan.account_id,
        &plan.dataset_id,
    )?;

    info!(namespace = %plan.namespace, "Getting BI user");
    let user_arn = api
        .list_users(&plan.account_id, &plan.namespace)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ProvisionError::NoUsers {
            namespace: plan.namespace.clone(),
        })?;

    info!(data_source_id = %plan.data_source_id, "Creating data source");
    api.create_data_source(&plan.data_source_request(&user_arn))
        .await?;

    info!(dataset_id = %plan.dataset_id, "Creating dataset");
    api.create_dataset(&plan.dataset_request(&user_arn)).await?;

    info!(dashboard_id = %plan.dashboard_id, "Creating dashboard");
    let creation = api
        .create_dashboard(&plan.dashboard_request(&user_arn, definition))
        .await?;

    let status = if creation.status.is_pending() {
        info!("Dashboard creation started; waiting for it to become available");
        wait_for_dashboard(api, &plan.account_id, &plan.dashboard_id, poll).await?
    } else if creation.status.is_success() {
        creation.status
    } else {
        return Err(ProvisionError::TerminalState {
            dashboard_id: plan.dashboard_id.clone(),
            status: creation.status,
        });
    };

    info!(dashboard_arn = %creation.arn, status = %status, "Dashboard ready");
    Ok(DashboardReport {
        user_arn,
        dataset_id: plan.dataset_id.clone(),
        dashboard_arn: creation.arn,
        status,
    })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trip() {
        for raw in [
            "CREATION_IN_PROGRESS",
            "CREATION_SUCCESSFUL",
            "CREATION_FAILED",
            "UPDATE_IN_PROGRESS",
            "UPDATE_SUCCESSFUL",
            "UPDATE_FAILED",
            "DELETED",
        ] {
            assert_eq!(DashboardStatus::from_api(raw).as_str(), raw);
        }

        let other = DashboardStatus::from_api("SOMETHING_NEW");
        assert_eq!(other, DashboardStatus::Other("SOMETHING_NEW".into()));
        assert!(other.is_terminal());
        assert!(!other.is_success());
    }

    #[test]
    fn test_status_classification() {
        assert!(DashboardStatus::CreationInProgress.is_pending());
        assert!(DashboardStatus::CreationSuccessful.is_success());
        assert!(DashboardStatus::CreationFailed.is_terminal());
        assert!(!DashboardStatus::UpdateSuccessful.is_success());
    }

    #[test]
    fn test_arns() {
        assert_eq!(
            data_source_arn("us-east-1", "123456789012", "AthenaDataSource"),
            "arn:aws:quicksight:us-east-1:123456789012:datasource/AthenaDataSource"
        );
        assert_eq!(
            dataset_arn("us-east-1", "123456789012", "abc"),
            "arn:aws:quicksight:us-east-1:123456789012:dataset/abc"
        );
    }

    #[test]
    fn test_dashboard_definition_sets_dataset_arn() {
        let document = json!({
            "DataSetIdentifierDeclarations": [
                {"Identifier": "partitioned", "DataSetArn": "arn:placeholder"}
            ],
            "Sheets": []
        });

        let patched = dashboard_definition(document, "eu-west-1", "123456789012", "ds-1").unwrap();
        assert_eq!(
            patched["DataSetIdentifierDeclarations"][0]["DataSetArn"],
            json!("arn:aws:quicksight:eu-west-1:123456789012:dataset/ds-1")
        );
        assert_eq!(
            patched["DataSetIdentifierDeclarations"][0]["Identifier"],
            json!("partitioned")
        );
        assert_eq!(patched["Sheets"], json!([]));
    }

    #[test]
    fn test_dashboard_definition_requires_declaration() {
        let err = dashboard_definition(json!({"Sheets": []}), "r", "a", "d").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidDefinition(_)));

        let err = dashboard_definition(json!({"DataSetIdentifierDeclarations": []}), "r", "a", "d")
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidDefinition(_)));
    }

    #[test]
    fn test_plan_requests() {
        let plan = DashboardPlan::new("123456789012", "us-east-1");
        assert_eq!(plan.dataset_id.len(), 36);

        let dataset = plan.dataset_request("arn:aws:quicksight:us-east-1:123456789012:user/default/admin");
        assert_eq!(dataset.input_columns.len(), 26);
        assert_eq!(
            dataset.input_columns[7],
            InputColumn {
                name: "processingtimemillis".into(),
                column_type: "INTEGER".into(),
            }
        );
        assert_eq!(
            dataset.data_source_arn,
            "arn:aws:quicksight:us-east-1:123456789012:datasource/AthenaDataSource"
        );
        assert_eq!(dataset.import_mode, "DIRECT_QUERY");

        let data_source = plan.data_source_request("user");
        assert_eq!(data_source.work_group, "SesAthenaWorkgroup");
        assert_eq!(data_source.actions.len(), 6);

        let dashboard = plan.dashboard_request("user", json!({}));
        assert_eq!(dashboard.theme_arn, DEFAULT_THEME_ARN);
        assert_eq!(dashboard.actions.len(), 8);

        let column = serde_json::to_value(&dataset.input_columns[0]).unwrap();
        assert_eq!(column, json!({"Name": "bouncetype", "Type": "STRING"}));
    }

    #[test]
    fn test_dashboard_request_publish_options() {
        let plan = DashboardPlan::new("123456789012", "us-east-1");
        let request = serde_json::to_value(plan.dashboard_request("user", json!({}))).unwrap();
        assert_eq!(
            request["DashboardPublishOptions"],
            json!({
                "AdHocFilteringOption": {"AvailabilityStatus": "DISABLED"},
                "ExportToCSVOption": {"AvailabilityStatus": "ENABLED"},
                "SheetControlsOption": {"VisibilityState": "EXPANDED"}
            })
        );
        assert_eq!(request["VersionDescription"], json!("1"));
    }
}
