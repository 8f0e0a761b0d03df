use std::time::Duration;

use anyhow::{bail, Context, Result};
use rusb::{Direction, GlobalContext, TransferType};

use crate::Transport;

const VENDOR_ID: u16 = 0x0519;
const PRODUCT_ID: u16 = 0x000b;

pub type Device = rusb::Device<GlobalContext>;
pub type DeviceHandle = rusb::DeviceHandle<GlobalContext>;

/// A USB transport for [`Printer`](crate::Printer).
pub struct UsbTransport {
	handle: DeviceHandle,
	epout: u8,
}

impl UsbTransport {
	/// Get a list of printer devices connected via usb.
	pub fn list() -> rusb::Result<Vec<Device>> {
		let devs = rusb::devices()?
			.iter()
			.filter(|dev| {
				let Ok(desc) = dev.device_descriptor() else {
					log::error!("cannot get device descriptor for device {dev:?}");
					return false
				};

				desc.vendor_id() == VENDOR_ID && desc.product_id() == PRODUCT_ID
			})
			.collect();
		Ok(devs)
	}

	/// Open the first printer found on the bus.
	pub fn find() -> Result<Self> {
		let devs = Self::list().context("cannot get list of usb devices")?;
		let Some(dev) = devs.first() else {
			bail!("no printer found");
		};
		Self::open(dev)
	}

	/// Open a USB printing device.
	pub fn open(dev: &Device) -> Result<Self> {
		let handle = dev
			.open()
			.context("cannot open usb device")?;

		// automatically steal the USB device from the kernel
		let _ = handle.set_auto_detach_kernel_driver(true);

		let dd = dev
			.device_descriptor()
			.context("cannot get usb device descriptor")?;

		log::debug!("USB device descriptor = {dd:#?}");
		if let Ok(s) = handle.read_manufacturer_string_ascii(&dd) {
			log::info!("USB Vendor: {s}");
		}
		if let Ok(s) = handle.read_product_string_ascii(&dd) {
			log::info!("USB Product: {s}");
		}
		if let Ok(s) = handle.read_serial_number_string_ascii(&dd) {
			log::info!("USB Serial: {s}");
		}

		let cd = dev
			.config_descriptor(0)
			.context("cannot get usb config descriptor")?;
		log::debug!("USB configuration descriptor 0: {cd:#?}");

		log::info!("Is usb kernel driver active: {:?}", handle.kernel_driver_active(0));

		// The printer only ever receives data from us; take the first
		// bulk OUT endpoint, wherever the firmware put it.
		let mut found = None;
		'search: for int in cd.interfaces() {
			for id in int.descriptors() {
				for epd in id.endpoint_descriptors() {
					if epd.direction() == Direction::Out
						&& epd.transfer_type() == TransferType::Bulk
					{
						found = Some((id.interface_number(), epd.address()));
						break 'search;
					}
				}
			}
		}

		let Some((iface, epout)) = found else {
			bail!("printer has no bulk OUT endpoint");
		};
		log::debug!("using interface {iface}, endpoint {epout:#04x}");

		handle.claim_interface(iface).context("cannot claim usb interface")?;

		Ok(Self {
			handle,
			epout,
		})
	}
}

impl Transport for UsbTransport {
	fn send(&mut self, buf: &[u8], timeout: Duration) -> Result<()> {
		self.handle.write_bulk(self.epout, buf, timeout)?;
		Ok(())
	}
}
