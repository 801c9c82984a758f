use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of devices processed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: i64,
    pub batch_tag: String,
    pub created_at: DateTime<Utc>,
}

/// The persisted attributes of one physical unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub import_id: Option<i64>,
    #[serde(rename = "sn_device")]
    pub serial: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub work_order: Option<String>,
    #[serde(default)]
    pub device_label: Option<String>,
    #[serde(default)]
    pub items_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, rename = "user_info_raw")]
    pub raw_user_info: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            ..Self::default()
        }
    }

    pub fn field(&self, field: DeviceField) -> Option<&str> {
        match field {
            DeviceField::Serial => Some(self.serial.as_str()),
            DeviceField::FullName => self.full_name.as_deref(),
            DeviceField::Email => self.email.as_deref(),
            DeviceField::PhoneNumber => self.phone_number.as_deref(),
            DeviceField::WorkOrder => self.work_order.as_deref(),
            DeviceField::DeviceLabel => self.device_label.as_deref(),
            DeviceField::ItemsNumber => self.items_number.as_deref(),
            DeviceField::Address => self.address.as_deref(),
            DeviceField::Category => self.category.as_deref(),
            DeviceField::ModelName => self.model_name.as_deref(),
        }
    }

    /// True when the field holds something other than whitespace.
    pub fn has_value(&self, field: DeviceField) -> bool {
        self.field(field)
            .is_some_and(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    Serial,
    FullName,
    Email,
    PhoneNumber,
    WorkOrder,
    DeviceLabel,
    ItemsNumber,
    Address,
    Category,
    ModelName,
}

impl DeviceField {
    pub fn column_name(&self) -> &'static str {
        match self {
            DeviceField::Serial => "sn_device",
            DeviceField::FullName => "full_name",
            DeviceField::Email => "email",
            DeviceField::PhoneNumber => "phone_number",
            DeviceField::WorkOrder => "work_order",
            DeviceField::DeviceLabel => "device_label",
            DeviceField::ItemsNumber => "items_number",
            DeviceField::Address => "address",
            DeviceField::Category => "category",
            DeviceField::ModelName => "model_name",
        }
    }
}
