use std::fmt;

use serde::{Deserialize, Serialize};

/// Device attributes extracted from a free-text user info field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub work_order: Option<String>,
    pub device_label: Option<String>,
    #[serde(rename = "sn_device")]
    pub serial: Option<String>,
}

impl ParsedFields {
    pub fn is_empty(&self) -> bool {
        FieldSlot::ALL.iter().all(|slot| self.get(*slot).is_none())
    }

    pub fn get(&self, slot: FieldSlot) -> Option<&str> {
        self.slot_ref(slot).as_deref()
    }

    fn slot_ref(&self, slot: FieldSlot) -> &Option<String> {
        match slot {
            FieldSlot::FullName => &self.full_name,
            FieldSlot::Email => &self.email,
            FieldSlot::PhoneNumber => &self.phone_number,
            FieldSlot::WorkOrder => &self.work_order,
            FieldSlot::DeviceLabel => &self.device_label,
            FieldSlot::Serial => &self.serial,
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: FieldSlot) -> &mut Option<String> {
        match slot {
            FieldSlot::FullName => &mut self.full_name,
            FieldSlot::Email => &mut self.email,
            FieldSlot::PhoneNumber => &mut self.phone_number,
            FieldSlot::WorkOrder => &mut self.work_order,
            FieldSlot::DeviceLabel => &mut self.device_label,
            FieldSlot::Serial => &mut self.serial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSlot {
    FullName,
    Email,
    PhoneNumber,
    WorkOrder,
    DeviceLabel,
    Serial,
}

impl FieldSlot {
    pub const ALL: [FieldSlot; 6] = [
        FieldSlot::FullName,
        FieldSlot::Email,
        FieldSlot::PhoneNumber,
        FieldSlot::WorkOrder,
        FieldSlot::DeviceLabel,
        FieldSlot::Serial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSlot::FullName => "full_name",
            FieldSlot::Email => "email",
            FieldSlot::PhoneNumber => "phone_number",
            FieldSlot::WorkOrder => "work_order",
            FieldSlot::DeviceLabel => "device_label",
            FieldSlot::Serial => "sn_device",
        }
    }
}

impl fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One serial number row from a device upload sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialRow {
    pub serial: String,
    pub items_number: Option<String>,
}

impl SerialRow {
    pub fn new(serial: impl Into<String>, items_number: Option<String>) -> Self {
        Self {
            serial: serial.into(),
            items_number,
        }
    }
}

/// Batch-level values copied onto every device of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub category: Option<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUpload {
    Metadata(BatchMetadata),
    Serials(Vec<SerialRow>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateRow {
    pub serial: String,
    pub device_label: Option<String>,
    pub items_number: Option<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateSheet {
    pub rows: Vec<BulkUpdateRow>,
    pub skipped: usize,
}
