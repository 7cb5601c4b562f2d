use serde::{Deserialize, Serialize};

use crate::container::{ContainerHeader, ContainerType};
use crate::cursor::ByteReader;
use crate::error::{FrameError, Result};

/// Maximum number of parameters an event carries.
pub const MAX_EVENT_PARAMS: usize = 3;

/// An asynchronous notification from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub code: u16,
    /// Transaction the event relates to, or 0.
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl Event {
    pub fn new(code: u16, transaction_id: u32) -> Self {
        Self {
            code,
            transaction_id,
            params: Vec::new(),
        }
    }

    /// An event with parameters, rejecting more than [`MAX_EVENT_PARAMS`].
    pub fn with_params(code: u16, transaction_id: u32, params: &[u32]) -> Result<Self> {
        if params.len() > MAX_EVENT_PARAMS {
            return Err(FrameError::TooManyParams {
                count: params.len(),
                max: MAX_EVENT_PARAMS,
            });
        }
        Ok(Self {
            code,
            transaction_id,
            params: params.to_vec(),
        })
    }

    pub fn param(&self, index: usize) -> Option<u32> {
        self.params.get(index).copied()
    }

    /// Decode code, transaction id and trailing parameters from `body`.
    pub fn decode_body(body: &[u8]) -> Result<Self> {
        let mut cursor = ByteReader::new(body);
        let code = cursor.read_u16()?;
        let transaction_id = cursor.read_u32()?;
        let params = cursor.read_u32_tail(MAX_EVENT_PARAMS)?;
        Ok(Self {
            code,
            transaction_id,
            params,
        })
    }

    /// Build an event from a generic event container.
    pub fn from_container(header: &ContainerHeader, payload: &[u8]) -> Result<Self> {
        header.expect(ContainerType::Event)?;
        let params = ByteReader::new(payload).read_u32_tail(MAX_EVENT_PARAMS)?;
        Ok(Self {
            code: header.code,
            transaction_id: header.transaction_id,
            params,
        })
    }
}
