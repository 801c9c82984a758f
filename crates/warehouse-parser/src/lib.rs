pub mod errors;
pub mod model;
pub mod sheets;
mod user_info;

pub use errors::SheetError;
pub use model::{
    BatchMetadata, BulkUpdateRow, BulkUpdateSheet, DeviceUpload, FieldSlot, ParsedFields,
    SerialRow,
};
pub use sheets::{interpret_bulk_update, interpret_device_upload};
pub use user_info::{
    assign_tokens, classify_token, parse_user_info, tokenize, TokenAssignment, TOKEN_DELIMITER,
};
