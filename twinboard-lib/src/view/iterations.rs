//! Model iteration viewer.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::model::ModelicaFile;

/// Progress of one model generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// One generated model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelIteration {
    pub version: String,
    pub status: IterationStatus,
    pub accuracy: Option<f64>,
    pub visualization_path: Option<String>,
    pub modelica_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl From<&ModelicaFile> for ModelIteration {
    fn from(file: &ModelicaFile) -> Self {
        Self {
            version: file.version.clone(),
            status: IterationStatus::Completed,
            accuracy: file.accuracy,
            visualization_path: None,
            modelica_code: None,
            error: None,
            timestamp: file.generated_at.to_rfc3339(),
        }
    }
}

/// Accuracy as shown to users; zero and missing both read `N/A`.
pub fn accuracy_label(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(accuracy) if accuracy != 0.0 && accuracy.is_finite() => format!("{:.2}%", accuracy),
        _ => "N/A".to_string(),
    }
}

/// Browsing state over a machine's model iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationViewer {
    iterations: Vec<ModelIteration>,
    selected: usize,
    current_iteration: usize,
    max_iterations: usize,
    generating: bool,
}

impl IterationViewer {
    pub fn new(iterations: Vec<ModelIteration>, current_iteration: usize, max_iterations: usize) -> Self {
        Self {
            iterations,
            selected: 0,
            current_iteration,
            max_iterations,
            generating: false,
        }
    }

    pub fn iterations(&self) -> &[ModelIteration] {
        &self.iterations
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&ModelIteration> {
        self.iterations.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.iterations.len().saturating_sub(1));
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn next(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn can_go_previous(&self) -> bool {
        self.selected != 0
    }

    pub fn can_go_next(&self) -> bool {
        !self.iterations.is_empty() && self.selected != self.iterations.len() - 1
    }

    pub fn set_generating(&mut self, generating: bool) {
        self.generating = generating;
    }

    pub fn header(&self) -> String {
        format!("Iteration {} of {}", self.current_iteration, self.max_iterations)
    }

    pub fn button_label(&self) -> &'static str {
        if self.generating {
            "Generating Model..."
        } else if self.iterations.is_empty() {
            "Generate Initial Model"
        } else {
            "Generate New Iteration"
        }
    }

    /// Plain-text rendering of the selected iteration.
    pub fn render_text(&self, original_visualization: Option<&str>) -> String {
        let mut out = format!("Model Iterations   {}\n", self.header());
        if let Some(iteration) = self.selected() {
            let pager: Vec<String> = (1..=self.iterations.len())
                .map(|n| {
                    if n == self.selected + 1 {
                        format!("[{}]", n)
                    } else {
                        n.to_string()
                    }
                })
                .collect();
            out.push_str(&format!("  {}\n", pager.join(" ")));
            out.push_str(&format!(
                "  Version {} ({})   {}\n",
                iteration.version, iteration.status, iteration.timestamp
            ));
            out.push_str(&format!("  Accuracy: {}\n", accuracy_label(iteration.accuracy)));
            out.push_str(&format!(
                "  Original Data: {}\n",
                original_visualization.unwrap_or("No original data visualization")
            ));
            let output = match (&iteration.visualization_path, iteration.status) {
                (Some(path), _) => path.as_str(),
                (None, IterationStatus::Running) => "Generating visualization...",
                (None, _) => "No visualization available",
            };
            out.push_str(&format!("  Model Output: {}\n", output));
            if let Some(error) = &iteration.error {
                out.push_str(&format!("  Error: {}\n", error));
            }
        }
        out.push_str(&format!("  <{}>\n", self.button_label()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration(version: &str, status: IterationStatus) -> ModelIteration {
        ModelIteration {
            version: version.to_string(),
            status,
            accuracy: None,
            visualization_path: None,
            modelica_code: None,
            error: None,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut viewer = IterationViewer::new(
            vec![
                iteration("1", IterationStatus::Completed),
                iteration("2", IterationStatus::Running),
            ],
            2,
            5,
        );
        assert!(!viewer.can_go_previous());
        viewer.previous();
        assert_eq!(viewer.selected_index(), 0);
        viewer.next();
        viewer.next();
        assert_eq!(viewer.selected_index(), 1);
        assert!(!viewer.can_go_next());
        viewer.select(10);
        assert_eq!(viewer.selected_index(), 1);
        assert_eq!(viewer.header(), "Iteration 2 of 5");
    }

    #[test]
    fn test_button_label() {
        let mut viewer = IterationViewer::new(Vec::new(), 0, 5);
        assert_eq!(viewer.button_label(), "Generate Initial Model");
        assert!(!viewer.can_go_next());
        viewer.set_generating(true);
        assert_eq!(viewer.button_label(), "Generating Model...");
        let viewer = IterationViewer::new(vec![iteration("1", IterationStatus::Failed)], 1, 5);
        assert_eq!(viewer.button_label(), "Generate New Iteration");
    }

    #[test]
    fn test_accuracy_label() {
        assert_eq!(accuracy_label(Some(91.256)), "91.26%");
        assert_eq!(accuracy_label(Some(0.0)), "N/A");
        assert_eq!(accuracy_label(None), "N/A");
    }

    #[test]
    fn test_running_iteration_text() {
        let viewer = IterationViewer::new(vec![iteration("1", IterationStatus::Running)], 1, 5);
        let text = viewer.render_text(None);
        assert!(text.contains("Generating visualization..."));
        assert!(text.contains("No original data visualization"));
    }

    #[test]
    fn test_iteration_json_names() {
        let json = serde_json::to_value(iteration("3", IterationStatus::Failed)).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("visualizationPath").is_some());
        assert!(json.get("error").is_none());
    }
}
