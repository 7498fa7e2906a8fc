//! Column set for browsing machines.

use uuid::Uuid;

use super::column::ColumnDef;
use super::column::ColumnGroup;
use super::column::ColumnRegistry;
use super::value::CellValue;
use super::value::TableRow;
use crate::model::MachineStatus;
use crate::model::MachineSummary;

/// Columns of the machine list.
pub fn machine_columns() -> ColumnRegistry {
    ColumnRegistry::new(vec![
        ColumnDef::new("id", "ID").text().hidden().width(300),
        ColumnDef::new("name", "Name").text().width(200),
        ColumnDef::new("status", "Status")
            .select_with(MachineStatus::ALL.iter().map(MachineStatus::as_str))
            .width(120),
        ColumnDef::new("accuracy", "Accuracy").range().width(100),
        ColumnDef::new("lastUpdated", "Last Updated").width(160),
        ColumnDef::new("dataPoints", "Data Points").range().width(100),
        ColumnDef::new("fields", "Fields").text().hidden().width(240),
        ColumnDef::new("originalFileName", "File").text().hidden(),
    ])
    .with_group(ColumnGroup::new(
        "dataset",
        "Dataset",
        ["dataPoints", "fields", "originalFileName"],
    ))
}

impl TableRow for MachineSummary {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }

    fn cell(&self, column_id: &str) -> CellValue {
        match column_id {
            "id" => self.id.to_string().into(),
            "name" => self.name.as_str().into(),
            "status" => self.status.as_str().into(),
            "accuracy" => self.accuracy.into(),
            "lastUpdated" => self.last_updated.into(),
            "dataPoints" => self.metadata.data_points.into(),
            "fields" => self.metadata.fields.join(", ").into(),
            "originalFileName" => self.metadata.original_file_name.as_str().into(),
            _ => CellValue::Empty,
        }
    }
}
