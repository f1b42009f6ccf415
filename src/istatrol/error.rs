use std::time::Duration;

use nusb::transfer::TransferError;

use crate::istatrol::DeviceIdentity;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceIdentity),

    #[error("failed to {action} device {identity}")]
    OpenFailed {
        identity: DeviceIdentity,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("no device open")]
    NoDeviceOpen,

    #[error("control transfer failed")]
    TransferFailed(#[source] TransferFailure),

    #[error("response too short: expected at least {expected} bytes, got {got}")]
    MalformedResponse { expected: usize, got: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum TransferFailure {
    #[error(transparent)]
    Usb(#[from] TransferError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TransferFailure> for DeviceError {
    fn from(failure: TransferFailure) -> Self {
        DeviceError::TransferFailed(failure)
    }
}
