//! Caller-supplied table settings.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Rows per page when the settings do not say.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Settings record handed to the table at mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableSettings {
    /// Classification label driving the heading.
    pub status: String,
    pub starting_page_index: Option<usize>,
    pub page_size: Option<usize>,
}

/// Title and description shown above the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub title: &'static str,
    pub description: &'static str,
}

impl TableSettings {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_starting_page_index(mut self, index: usize) -> Self {
        self.starting_page_index = Some(index);
        self
    }

    /// Reads settings leniently: wrong or missing fields become defaults.
    pub fn from_json(json: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(json) else {
            log::warn!("Ignoring unreadable table settings");
            return Self::default();
        };
        let index = |key: &str| value.get(key).and_then(Value::as_u64).map(|n| n as usize);
        Self {
            status: value
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            starting_page_index: index("startingPageIndex"),
            page_size: index("pageSize"),
        }
    }

    pub fn page_index(&self) -> usize {
        self.starting_page_index.unwrap_or(0)
    }

    /// Rows per page; zero counts as unset.
    pub fn page_size(&self) -> usize {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn heading(&self) -> Heading {
        match self.status.as_str() {
            "active" => Heading {
                title: "Active Machines",
                description: "View machines that are currently active.",
            },
            "inactive" => Heading {
                title: "Inactive Machines",
                description: "View machines that are not currently tracked.",
            },
            "error" => Heading {
                title: "Machines With Errors",
                description: "View machines whose processing or simulation failed.",
            },
            _ => Heading {
                title: "Machines",
                description: "View all machines.",
            },
        }
    }
}
