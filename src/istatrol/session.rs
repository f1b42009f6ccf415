use nusb::{Device, transfer::ControlIn};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::istatrol::{
    DeviceError, DeviceIdentity, RawSample, TransferFailure,
    protocol::{
        CONTROL_TYPE, INDEX, RECIPIENT, REQUEST, RESPONSE_LENGTH, TRANSFER_TIMEOUT, VALUE,
    },
};

/// Something the poll loop can (re)open and fetch raw samples from.
#[allow(async_fn_in_trait)]
pub trait SampleSource {
    async fn open(&mut self) -> Result<(), DeviceError>;

    async fn read_raw(&mut self) -> Result<RawSample, DeviceError>;
}

pub struct DeviceSession {
    identity: DeviceIdentity,
    device: Option<Device>,
}

impl DeviceSession {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            device: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn open_device(&self) -> Result<Device, DeviceError> {
        let identity = self.identity;
        let open_failed = |action, source| DeviceError::OpenFailed {
            identity,
            action,
            source,
        };

        let device_info = nusb::list_devices()
            .map_err(|e| open_failed("enumerate", e))?
            .find(|d| identity.matches(d.vendor_id(), d.product_id()))
            .ok_or(DeviceError::DeviceNotFound(identity))?;
        info!(
            bus = device_info.bus_number(),
            addr = device_info.device_address(),
            "found device {identity}"
        );

        let device = device_info.open().map_err(|e| open_failed("open", e))?;

        let active = match device.active_configuration() {
            Ok(config) => {
                debug!("configuration: {config:?}");
                Some(config.configuration_value())
            }
            Err(_) => None,
        };

        if active.is_none() {
            let first = device
                .configurations()
                .next()
                .map(|config| config.configuration_value())
                .unwrap_or(1);
            device
                .set_configuration(first)
                .map_err(|e| open_failed("configure", e))?;
            debug!(configuration = first, "selected configuration");
        }

        Ok(device)
    }
}

impl SampleSource for DeviceSession {
    /// Looks up the first device matching the identity and selects its
    /// configuration. On failure the previous handle is gone.
    async fn open(&mut self) -> Result<(), DeviceError> {
        self.device = None;
        self.device = Some(self.open_device()?);
        Ok(())
    }

    async fn read_raw(&mut self) -> Result<RawSample, DeviceError> {
        let device = self.device.as_ref().ok_or(DeviceError::NoDeviceOpen)?;

        let transfer = device.control_in(ControlIn {
            control_type: CONTROL_TYPE,
            recipient: RECIPIENT,
            request: REQUEST,
            value: VALUE,
            index: INDEX,
            length: RESPONSE_LENGTH,
        });

        let completion = timeout(TRANSFER_TIMEOUT, transfer)
            .await
            .map_err(|_| TransferFailure::Timeout(TRANSFER_TIMEOUT))?;

        let data = completion.into_result().map_err(TransferFailure::Usb)?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_without_open_fails() {
        let mut session = DeviceSession::new(DeviceIdentity::default());
        assert!(!session.is_open());
        assert!(matches!(
            session.read_raw().await,
            Err(DeviceError::NoDeviceOpen)
        ));
    }
}
