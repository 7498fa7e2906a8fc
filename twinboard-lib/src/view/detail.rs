//! Machine detail page.

use chrono::DateTime;
use chrono::Utc;

use crate::model::Machine;
use crate::model::MachineStatus;
use crate::model::ModelicaFile;

/// The most recently generated model, if any.
pub fn latest_model(machine: &Machine) -> Option<&ModelicaFile> {
    machine.file_paths.modelica_files.last()
}

/// Relative age of the last update.
pub fn time_since_update(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(updated_at) = updated_at else {
        return "Never".to_string();
    };
    let minutes = (now - updated_at).num_minutes();
    match minutes {
        m if m < 1 => "Just now".to_string(),
        m if m < 60 => format!("{} minutes ago", m),
        m if m < 1440 => format!("{} hours ago", m / 60),
        m => format!("{} days ago", m / 1440),
    }
}

/// Everything the detail page shows about one machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDetail {
    pub name: String,
    pub status: MachineStatus,
    pub last_updated: String,
    /// Latest model accuracy with one decimal, e.g. `87.5%`.
    pub accuracy: Option<String>,
    pub model_version: String,
    pub data_points: usize,
    pub fields: Vec<String>,
    /// Path of the original time-series plot.
    pub visualization: Option<String>,
    /// Model generation is unavailable for failed machines.
    pub can_generate: bool,
    pub model_history: usize,
}

impl MachineDetail {
    pub fn new(machine: &Machine, now: DateTime<Utc>) -> Self {
        let latest = latest_model(machine);
        Self {
            name: machine.name.clone(),
            status: machine.status,
            last_updated: time_since_update(Some(machine.updated_at), now),
            accuracy: latest
                .and_then(|model| model.accuracy)
                .map(|accuracy| format!("{:.1}%", accuracy)),
            model_version: latest
                .map(|model| model.version.clone())
                .filter(|version| !version.is_empty())
                .unwrap_or_else(|| "No model yet".to_string()),
            data_points: machine.metadata.data_points,
            fields: machine.metadata.fields.clone(),
            visualization: original_visualization(machine).map(str::to_string),
            can_generate: machine.status != MachineStatus::Error,
            model_history: machine.file_paths.modelica_files.len(),
        }
    }

    /// Plain-text rendering; `resolve` turns stored paths into links.
    pub fn render_text(&self, resolve: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n\n", self.name));
        out.push_str(&format!("Real-Time Data ({} data points)\n", self.data_points));
        match &self.visualization {
            Some(path) => out.push_str(&format!("  {}\n", resolve(path))),
            None => out.push_str("  No visualization available\n"),
        }
        out.push_str("\nData Fields\n");
        for field in &self.fields {
            out.push_str(&format!("  {}\n", field));
        }
        out.push_str("\nModelica Model Status\n");
        out.push_str(&format!("  Status:        {}\n", self.status));
        out.push_str(&format!("  Last Updated:  {}\n", self.last_updated));
        out.push_str(&format!(
            "  Accuracy:      {}\n",
            self.accuracy.as_deref().unwrap_or("N/A")
        ));
        out.push_str(&format!("  Model Version: {}\n", self.model_version));
        out.push_str(&format!("  Model History: {}\n", self.model_history));
        out
    }
}

/// Path of the first stored visualization.
pub fn original_visualization(machine: &Machine) -> Option<&str> {
    machine
        .file_paths
        .visualizations
        .first()
        .map(|v| v.path.as_str())
        .filter(|path| !path.is_empty())
}
