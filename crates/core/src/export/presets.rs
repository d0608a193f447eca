//! Named export presets.

use std::collections::BTreeMap;

use super::error::{ExportError, ExportResult};
use super::options::{ExportOptions, RowMapper};
use super::types::OrderBy;

/// Registry of named option sets, the middle precedence level.
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: BTreeMap<String, ExportOptions>,
}

impl PresetCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the back-office presets: `customers`, `users`, `brokers`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert("customers", customers());
        catalog.insert("users", users());
        catalog.insert("brokers", brokers());
        catalog
    }

    /// Registers or replaces a preset.
    pub fn insert(&mut self, name: impl Into<String>, options: ExportOptions) {
        self.presets.insert(name.into(), options);
    }

    /// Looks a preset up by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreset` if no preset has this name.
    pub fn get(&self, name: &str) -> ExportResult<&ExportOptions> {
        self.presets
            .get(name)
            .ok_or_else(|| ExportError::UnknownPreset(name.to_string()))
    }

    /// Preset names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

fn customers() -> ExportOptions {
    ExportOptions::new()
        .relations(["branch", "broker"])
        .headings([
            "ID",
            "Name",
            "Email",
            "Phone",
            "Status",
            "Branch",
            "Broker",
            "Created At",
        ])
        .mapping(RowMapper::new(|customer| {
            [
                "id",
                "name",
                "email",
                "phone",
                "status",
                "branch.name",
                "broker.name",
                "created_at",
            ]
            .iter()
            .map(|field| customer.get(field).clone())
            .collect()
        }))
        .filename_base("customers")
}

fn users() -> ExportOptions {
    ExportOptions::new()
        .relations(["role", "branch"])
        .columns([
            "id",
            "name",
            "email",
            "role.name",
            "branch.name",
            "is_active",
            "created_at",
        ])
        .headings(["ID", "Name", "Email", "Role", "Branch", "Active", "Created At"])
        .filename_base("users")
}

fn brokers() -> ExportOptions {
    ExportOptions::new()
        .columns(["code", "name", "email", "phone", "created_at"])
        .order_by(OrderBy::asc("name"))
        .filename_base("brokers")
}
