use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::cursor::{put_ptp_string, put_u16_array, ByteReader};
use crate::error::Result;

/// The device descriptor returned by GetDeviceInfo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub standard_version: u16,
    pub vendor_extension_id: u32,
    pub vendor_extension_version: u16,
    pub vendor_extension_desc: String,
    pub functional_mode: u16,
    pub operations_supported: Vec<u16>,
    pub events_supported: Vec<u16>,
    pub device_properties_supported: Vec<u16>,
    pub capture_formats: Vec<u16>,
    pub image_formats: Vec<u16>,
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub serial_number: String,
}

impl DeviceInfo {
    /// Decode the data phase of GetDeviceInfo.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteReader::new(data);
        Ok(Self {
            standard_version: cursor.read_u16()?,
            vendor_extension_id: cursor.read_u32()?,
            vendor_extension_version: cursor.read_u16()?,
            vendor_extension_desc: cursor.read_ptp_string()?,
            functional_mode: cursor.read_u16()?,
            operations_supported: cursor.read_u16_array()?,
            events_supported: cursor.read_u16_array()?,
            device_properties_supported: cursor.read_u16_array()?,
            capture_formats: cursor.read_u16_array()?,
            image_formats: cursor.read_u16_array()?,
            manufacturer: cursor.read_ptp_string()?,
            model: cursor.read_ptp_string()?,
            device_version: cursor.read_ptp_string()?,
            serial_number: cursor.read_ptp_string()?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u16_le(self.standard_version);
        dst.put_u32_le(self.vendor_extension_id);
        dst.put_u16_le(self.vendor_extension_version);
        put_ptp_string(dst, &self.vendor_extension_desc);
        dst.put_u16_le(self.functional_mode);
        put_u16_array(dst, &self.operations_supported);
        put_u16_array(dst, &self.events_supported);
        put_u16_array(dst, &self.device_properties_supported);
        put_u16_array(dst, &self.capture_formats);
        put_u16_array(dst, &self.image_formats);
        put_ptp_string(dst, &self.manufacturer);
        put_ptp_string(dst, &self.model);
        put_ptp_string(dst, &self.device_version);
        put_ptp_string(dst, &self.serial_number);
    }

    pub fn supports_operation(&self, code: u16) -> bool {
        self.operations_supported.contains(&code)
    }

    pub fn supports_event(&self, code: u16) -> bool {
        self.events_supported.contains(&code)
    }

    pub fn supports_property(&self, code: u16) -> bool {
        self.device_properties_supported.contains(&code)
    }
}
