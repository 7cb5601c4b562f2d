//! The few PTP codes the protocol engine itself depends on.
//!
//! Vendor catalogues belong to higher layers.

/// Operation codes.
pub mod op {
    pub const GET_DEVICE_INFO: u16 = 0x1001;
    pub const OPEN_SESSION: u16 = 0x1002;
    pub const CLOSE_SESSION: u16 = 0x1003;
}

/// Response codes.
pub mod rc {
    pub const OK: u16 = 0x2001;
    pub const GENERAL_ERROR: u16 = 0x2002;
    pub const SESSION_NOT_OPEN: u16 = 0x2003;
    pub const INVALID_TRANSACTION_ID: u16 = 0x2004;
    pub const OPERATION_NOT_SUPPORTED: u16 = 0x2005;
    pub const ACCESS_DENIED: u16 = 0x200F;
    pub const SESSION_ALREADY_OPEN: u16 = 0x201E;
}

/// Event codes.
pub mod ev {
    pub const CANCEL_TRANSACTION: u16 = 0x4001;
    pub const OBJECT_ADDED: u16 = 0x4002;
    pub const DEVICE_PROP_CHANGED: u16 = 0x4006;
}

/// Vendor extension id reported by Fujifilm bodies.
pub const VENDOR_FUJI: u32 = 0x0000_000E;
