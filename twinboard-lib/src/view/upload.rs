//! Upload form state.

use crate::client::MachinesClient;
use crate::model::Machine;
use crate::model::MachineData;

pub const MISSING_FIELDS: &str = "Both machine name and file are required";
pub const INVALID_JSON: &str = "Error processing file. Please ensure it is valid JSON.";
pub const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";

/// A file picked in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// State of the "new machine" form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    name: String,
    file: Option<SelectedFile>,
    error: Option<&'static str>,
    uploading: bool,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Picks a file; clears any previous error.
    pub fn select_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.file = Some(SelectedFile {
            name: name.into(),
            bytes,
        });
        self.error = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Checks that both a name and a file were given.
    pub fn validate(&mut self) -> bool {
        let valid = !self.name.trim().is_empty() && self.file.is_some();
        self.error = if valid { None } else { Some(MISSING_FIELDS) };
        valid
    }

    /// Parses the picked file locally before sending it.
    pub fn preview(&mut self) -> Option<MachineData> {
        let file = self.file.as_ref()?;
        match MachineData::parse(&file.bytes) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Rejected {}: {}", file.name, e);
                self.error = Some(INVALID_JSON);
                None
            }
        }
    }

    /// Sends the form. On success the form is cleared and the new machine
    /// returned; on failure the form keeps its input and shows an error.
    pub async fn submit(&mut self, client: &MachinesClient) -> Option<Machine> {
        if !self.validate() {
            return None;
        }
        let file = self.file.clone()?;

        self.uploading = true;
        let result = client
            .upload(self.name.trim(), &file.name, file.bytes)
            .await;
        self.uploading = false;

        match result {
            Ok(machine) => {
                self.reset();
                Some(machine)
            }
            Err(e) => {
                log::error!("Error uploading file: {}", e);
                self.error = Some(UPLOAD_FAILED);
                None
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
