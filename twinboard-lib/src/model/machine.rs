//! Machine records as stored and served by the machines API.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::MachineData;

/// Operating status of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    /// Uploaded and processed; the default for new machines.
    #[default]
    Active,
    /// Not currently tracked.
    Inactive,
    /// Processing or simulation failed.
    Error,
}

impl MachineStatus {
    /// All statuses, in display order.
    pub const ALL: [MachineStatus; 3] = [Self::Active, Self::Inactive, Self::Error];

    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown machine status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for MachineStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A machine row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: Uuid,
    pub name: String,
    pub status: MachineStatus,
    pub accuracy: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_paths: FilePaths,
    pub metadata: MachineMetadata,
}

/// Files produced for a machine: the raw upload, plots, models and logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawDataFile>,
    #[serde(default)]
    pub visualizations: Vec<VisualizationFile>,
    #[serde(default)]
    pub modelica_files: Vec<ModelicaFile>,
    #[serde(default)]
    pub logs: Vec<LogFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataFile {
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationFile {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub generated_at: DateTime<Utc>,
}

/// A generated Modelica model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelicaFile {
    pub path: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFile {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Summary of the uploaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineMetadata {
    pub original_file_name: String,
    pub upload_timestamp: Option<DateTime<Utc>>,
    pub data_points: usize,
    pub fields: Vec<String>,
}

/// List projection of a machine, as returned by `GET /api/machines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSummary {
    pub id: Uuid,
    pub name: String,
    pub status: MachineStatus,
    pub accuracy: Option<f64>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    pub file_paths: FilePaths,
    pub metadata: MachineMetadata,
}

impl From<Machine> for MachineSummary {
    fn from(machine: Machine) -> Self {
        Self {
            id: machine.id,
            name: machine.name,
            status: machine.status,
            accuracy: machine.accuracy,
            last_updated: machine.updated_at,
            file_paths: machine.file_paths,
            metadata: machine.metadata,
        }
    }
}

/// Partial update applied by `PATCH /api/machines/{id}`.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MachineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<FilePaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MachineMetadata>,
}

impl MachinePatch {
    /// Returns `true` if the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.accuracy.is_none()
            && self.file_paths.is_none()
            && self.metadata.is_none()
    }

    pub fn status(mut self, status: MachineStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Applies the patch to an in-memory machine.
    pub fn apply_to(&self, machine: &mut Machine, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            machine.status = status;
        }
        if let Some(accuracy) = self.accuracy {
            machine.accuracy = Some(accuracy);
        }
        if let Some(file_paths) = &self.file_paths {
            machine.file_paths = file_paths.clone();
        }
        if let Some(metadata) = &self.metadata {
            machine.metadata = metadata.clone();
        }
        machine.updated_at = now;
    }
}

/// A machine about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMachine {
    pub name: String,
    pub status: MachineStatus,
    pub file_paths: FilePaths,
    pub metadata: MachineMetadata,
    pub created_at: DateTime<Utc>,
}

impl NewMachine {
    /// Builds the initial row for an uploaded dataset.
    ///
    /// New machines start `active` with the service's time-series plot as
    /// their only visualization.
    pub fn from_upload(
        name: impl Into<String>,
        file_name: impl Into<String>,
        size: u64,
        data: &MachineData,
        visualization_path: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            name: name.into(),
            status: MachineStatus::Active,
            file_paths: FilePaths {
                raw_data: Some(RawDataFile {
                    file_name: file_name.clone(),
                    uploaded_at: now,
                    size,
                }),
                visualizations: vec![VisualizationFile {
                    path: visualization_path.into(),
                    kind: "timeSeries".to_string(),
                    generated_at: now,
                }],
                modelica_files: Vec::new(),
                logs: Vec::new(),
            },
            metadata: MachineMetadata {
                original_file_name: file_name,
                upload_timestamp: Some(now),
                data_points: data.data_points(),
                fields: data.field_names(),
            },
            created_at: now,
        }
    }

    /// Assigns an id and produces the stored machine.
    pub fn into_machine(self, id: Uuid) -> Machine {
        Machine {
            id,
            name: self.name,
            status: self.status,
            accuracy: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            file_paths: self.file_paths,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(status.as_str().parse::<MachineStatus>(), Ok(status));
        }
        assert!("running".parse::<MachineStatus>().is_err());
    }

    #[test]
    fn test_summary_renames_updated_at() {
        let data = MachineData::default();
        let now = Utc::now();
        let machine = NewMachine::from_upload("m", "m.json", 10, &data, "plots/m.png", now)
            .into_machine(Uuid::new_v4());
        let json = serde_json::to_value(MachineSummary::from(machine)).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("updated_at").is_none());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["file_paths"]["visualizations"][0]["type"], "timeSeries");
        assert_eq!(json["file_paths"]["rawData"]["fileName"], "m.json");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(MachinePatch::default().is_empty());
        assert!(!MachinePatch::default().accuracy(0.5).is_empty());
        let patch: MachinePatch = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(patch.status, Some(MachineStatus::Error));
    }
}
