//! Device info synthesized for Fuji bodies that answer GetDeviceInfo with an
//! empty data phase over PTP/IP.

/// DeviceInfo dataset substituted for an empty Fuji GetDeviceInfo payload.
///
/// Vendor extension 0x0E (Fujifilm), model "X-T42", serial of zeros.
pub const FUJI_FALLBACK_DEVICE_INFO: &[u8] = &[
    // standard version, vendor extension id and version
    0x64, 0x00, 0x0e, 0x00, 0x00, 0x00, 0x64, 0x00,
    // vendor extension description
    0x16, 0x66, 0x00, 0x75, 0x00, 0x6a, 0x00, 0x69, 0x00, 0x66, 0x00, 0x69,
    0x00, 0x6c, 0x00, 0x6d, 0x00, 0x2e, 0x00, 0x63, 0x00, 0x6f, 0x00, 0x2e,
    0x00, 0x6a, 0x00, 0x70, 0x00, 0x3a, 0x00, 0x20, 0x00, 0x31, 0x00, 0x2e,
    0x00, 0x30, 0x00, 0x3b, 0x00, 0x20, 0x00, 0x00, 0x00,
    // functional mode
    0x00, 0x00,
    // operations
    0x1b, 0x00, 0x00, 0x00, 0x01, 0x10, 0x02, 0x10, 0x03, 0x10, 0x04, 0x10,
    0x05, 0x10, 0x06, 0x10, 0x07, 0x10, 0x08, 0x10, 0x09, 0x10, 0x0a, 0x10,
    0x0b, 0x10, 0x0e, 0x10, 0x0f, 0x10, 0x14, 0x10, 0x15, 0x10, 0x16, 0x10,
    0x17, 0x10, 0x18, 0x10, 0x1b, 0x10, 0x1c, 0x10, 0x0c, 0x90, 0x0d, 0x90,
    0x1d, 0x90, 0x01, 0x98, 0x02, 0x98, 0x03, 0x98, 0x05, 0x98,
    // events
    0x06, 0x00, 0x00, 0x00, 0x02, 0x40, 0x03, 0x40, 0x04, 0x40, 0x05, 0x40,
    0x0d, 0x40, 0x06, 0xc0,
    // device properties
    0xa8, 0x00, 0x00, 0x00, 0x01, 0x50, 0x03, 0x50, 0x05, 0x50, 0x0a, 0x50,
    0x0b, 0x50, 0x0c, 0x50, 0x0e, 0x50, 0x0f, 0x50, 0x11, 0x50, 0x12, 0x50,
    0x15, 0x50, 0x18, 0x50, 0x19, 0x50, 0x1c, 0x50, 0x01, 0xd0, 0x02, 0xd0,
    0x03, 0xd0, 0x04, 0xd0, 0x05, 0xd0, 0x07, 0xd0, 0x08, 0xd0, 0x09, 0xd0,
    0x0a, 0xd0, 0x0b, 0xd0, 0x0c, 0xd0, 0x0d, 0xd0, 0x0e, 0xd0, 0x0f, 0xd0,
    0x10, 0xd0, 0x11, 0xd0, 0x12, 0xd0, 0x13, 0xd0, 0x14, 0xd0, 0x15, 0xd0,
    0x16, 0xd0, 0x17, 0xd0, 0x18, 0xd0, 0x19, 0xd0, 0x1a, 0xd0, 0x1b, 0xd0,
    0x1c, 0xd0, 0x00, 0xd1, 0x01, 0xd1, 0x02, 0xd1, 0x03, 0xd1, 0x04, 0xd1,
    0x05, 0xd1, 0x06, 0xd1, 0x07, 0xd1, 0x08, 0xd1, 0x09, 0xd1, 0x0a, 0xd1,
    0x0b, 0xd1, 0x0c, 0xd1, 0x0d, 0xd1, 0x0e, 0xd1, 0x0f, 0xd1, 0x10, 0xd1,
    0x11, 0xd1, 0x12, 0xd1, 0x13, 0xd1, 0x14, 0xd1, 0x15, 0xd1, 0x16, 0xd1,
    0x17, 0xd1, 0x18, 0xd1, 0x19, 0xd1, 0x1a, 0xd1, 0x1b, 0xd1, 0x1c, 0xd1,
    0x1d, 0xd1, 0x1e, 0xd1, 0x1f, 0xd1, 0x20, 0xd1, 0x21, 0xd1, 0x22, 0xd1,
    0x23, 0xd1, 0x24, 0xd1, 0x25, 0xd1, 0x26, 0xd1, 0x27, 0xd1, 0x28, 0xd1,
    0x29, 0xd1, 0x2a, 0xd1, 0x2b, 0xd1, 0x2c, 0xd1, 0x2d, 0xd1, 0x2e, 0xd1,
    0x2f, 0xd1, 0x30, 0xd1, 0x31, 0xd1, 0x32, 0xd1, 0x33, 0xd1, 0x34, 0xd1,
    0x35, 0xd1, 0x36, 0xd1, 0x37, 0xd1, 0x38, 0xd1, 0x39, 0xd1, 0x3a, 0xd1,
    0x3b, 0xd1, 0x3c, 0xd1, 0x3d, 0xd1, 0x3e, 0xd1, 0x3f, 0xd1, 0x40, 0xd1,
    0x41, 0xd1, 0x42, 0xd1, 0x43, 0xd1, 0x44, 0xd1, 0x45, 0xd1, 0x46, 0xd1,
    0x47, 0xd1, 0x48, 0xd1, 0x49, 0xd1, 0x4a, 0xd1, 0x4b, 0xd1, 0x4c, 0xd1,
    0x4d, 0xd1, 0x4e, 0xd1, 0x4f, 0xd1, 0x50, 0xd1, 0x51, 0xd1, 0x52, 0xd1,
    0x53, 0xd1, 0x54, 0xd1, 0x55, 0xd1, 0x57, 0xd1, 0x58, 0xd1, 0x59, 0xd1,
    0x5a, 0xd1, 0x5b, 0xd1, 0x5c, 0xd1, 0x5d, 0xd1, 0x5e, 0xd1, 0x5f, 0xd1,
    0x60, 0xd1, 0x61, 0xd1, 0x00, 0xd2, 0x01, 0xd2, 0x02, 0xd2, 0x03, 0xd2,
    0x04, 0xd2, 0x05, 0xd2, 0x06, 0xd2, 0x07, 0xd2, 0x08, 0xd2, 0x09, 0xd2,
    0x0a, 0xd2, 0x0b, 0xd2, 0x0c, 0xd2, 0x0d, 0xd2, 0x0e, 0xd2, 0x0f, 0xd2,
    0x10, 0xd2, 0x11, 0xd2, 0x12, 0xd2, 0x13, 0xd2, 0x14, 0xd2, 0x15, 0xd2,
    0x16, 0xd2, 0x17, 0xd2, 0x18, 0xd2, 0x19, 0xd2, 0x1a, 0xd2, 0x1b, 0xd2,
    0x06, 0xd4, 0x07, 0xd4,
    // capture formats
    0x03, 0x00, 0x00, 0x00, 0x00, 0x38, 0x01, 0x38, 0x03, 0xb1,
    // image formats
    0x04, 0x00, 0x00, 0x00, 0x00, 0x38, 0x01, 0x38, 0x03, 0xb1, 0x0d, 0x38,
    // manufacturer
    0x09, 0x46, 0x00, 0x55, 0x00, 0x4a, 0x00, 0x49, 0x00, 0x46, 0x00, 0x49,
    0x00, 0x4c, 0x00, 0x4d, 0x00, 0x00, 0x00,
    // model
    0x06, 0x58, 0x00, 0x2d, 0x00, 0x54, 0x00, 0x34, 0x00, 0x32, 0x00, 0x00,
    0x00,
    // device version
    0x05, 0x31, 0x00, 0x2e, 0x00, 0x30, 0x00, 0x31, 0x00, 0x00, 0x00,
    // serial number
    0x1f, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30,
    0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30,
    0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30,
    0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30,
    0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00, 0x30,
    0x00, 0x00, 0x00,
];
