use std::{
	fs::{File, OpenOptions},
	io::Write,
	path::Path,
	time::Duration,
};
use anyhow::Result;

use crate::Transport;

/// A transport that writes frames straight to a device node,
/// e.g. `/dev/usb/lp0`.
pub struct FileTransport {
	file: File,
}

impl FileTransport {
	/// Open a device node for writing.
	pub fn open(path: &Path) -> Result<Self> {
		let file = OpenOptions::new().write(true).open(path)?;
		Ok(Self { file })
	}
}

impl Transport for FileTransport {
	fn send(&mut self, buf: &[u8], _timeout: Duration) -> Result<()> {
		// TODO: timeout
		self.file.write_all(buf)?;
		Ok(())
	}
}
