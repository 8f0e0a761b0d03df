//! Raster driver for ESC/POS line-thermal printers. Images are cut into
//! horizontal stripes, bit-packed, and streamed as `GS v 0` frames, with a
//! cooldown between bursts so the print head does not overheat.

use std::time::Duration;

use thiserror::Error;

mod stripe;
mod throttle;

pub use crate::stripe::{Stripe, StripeError, MAX_PAYLOAD};
pub use crate::throttle::{Pause, Sleep, Throttle};

macro_rules! transports {
	[$($(# [$($m:tt)*])? $mod:ident :: $name:ident),* $(,)?] => {
		$(
			$(# [$($m)*])*
			mod $mod;
			$(# [$($m)*])*
			pub use crate::$mod::$name;
		)*
	};
}

transports! [
	#[cfg(feature = "usb")]
	usb::UsbTransport,
	#[cfg(feature = "file")]
	file::FileTransport,
];

/// Feed past the print head and cut: LF, then `GS V A 1`.
/// Sent exactly once, after the last stripe of a job.
const FINISH: [u8; 5] = [0x0a, 0x1d, 0x56, 0x41, 0x01];

/// Transport the printer streams frames into.
///
/// Implementations only promise that bytes are delivered in call order;
/// the driver never reads back from the device.
pub trait Transport {
	/// Send data to the printer.
	fn send(&mut self, buf: &[u8], timeout: Duration) -> anyhow::Result<()>;
}

/// A monochrome image to be printed.
///
/// `true` is a white/background sample and leaves the paper blank;
/// `false` is ink. Sources must not change for the duration of a job.
pub trait Source {
	/// Width in dots.
	fn width(&self) -> usize;

	/// Height in rows.
	fn height(&self) -> usize;

	/// Sample the dot at `(x, y)`.
	fn pixel(&self, x: usize, y: usize) -> bool;
}

/// Per-job knobs. The defaults match the printer's comfortable limits;
/// only `vlimit` is commonly changed.
#[derive(Debug, Clone)]
pub struct Config {
	/// Maximum number of image rows that will ever be printed,
	/// regardless of the source height.
	pub vlimit: usize,

	/// Rows per stripe. One `GS v 0` frame is emitted per stripe.
	pub stripe_height: usize,

	/// Printed rows between cooldowns.
	pub cooldown_every: usize,

	/// How long to idle once the cooldown threshold is crossed.
	pub cooldown: Duration,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			vlimit: 3000,
			stripe_height: 32,
			cooldown_every: 1000,
			cooldown: Duration::from_millis(1500),
		}
	}
}

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Stripe(#[from] StripeError),

	#[error("transport error: {0}")]
	Transport(anyhow::Error),
}

/// ESC/POS raster printer.
pub struct Printer {
	transport: Box<dyn Transport>,
	config: Config,
	throttle: Throttle,
}

impl Printer {
	/// Construct a printer with the default [`Config`].
	pub fn new(transport: impl Transport + 'static) -> Self {
		Self::with_config(transport, Config::default())
	}

	pub fn with_config(transport: impl Transport + 'static, config: Config) -> Self {
		let throttle = Throttle::new(config.cooldown_every, config.cooldown);
		Self {
			transport: Box::new(transport),
			config,
			throttle,
		}
	}

	/// Like [`Printer::with_config`], with the cooldown pause strategy
	/// replaced. Lets tests observe throttling without real elapsed time.
	pub fn with_pause(
		transport: impl Transport + 'static,
		config: Config,
		pause: impl Pause + 'static,
	) -> Self {
		let throttle = Throttle::with_pause(config.cooldown_every, config.cooldown, pause);
		Self {
			transport: Box::new(transport),
			config,
			throttle,
		}
	}

	fn send(&mut self, buf: &[u8], timeout: u64) -> Result<(), Error> {
		log::trace!("send({}{buf:x?}, {timeout}s);", buf.len());
		self.transport
			.send(buf, Duration::from_secs(timeout))
			.map_err(Error::Transport)
	}

	/// Print `src`, top to bottom.
	///
	/// Rows are packed into stripes of [`Config::stripe_height`] rows,
	/// each flushed as one `GS v 0` frame, followed by a single
	/// feed-and-cut trailer. Rows past [`Config::vlimit`] are never read.
	///
	/// # Overheating
	/// Long jobs heat the print head enough to smear. After every
	/// [`Config::cooldown_every`] printed rows the driver blocks for
	/// [`Config::cooldown`] before sending the next stripe.
	///
	/// # Errors
	/// A [`StripeError`] means the width/stripe-height combination cannot
	/// be framed for this device; a transport failure surfaces as
	/// [`Error::Transport`]. Both abort the job with no trailer, and
	/// frames already sent are not rolled back.
	pub fn print(&mut self, src: &dyn Source) -> Result<(), Error> {
		let width = src.width();
		let padding = padding(width);
		let total = src.height().min(self.config.vlimit);

		self.throttle.reset();

		let mut row = 0;
		let mut remaining = if width == 0 { 0 } else { total };
		while remaining > 0 {
			let height = remaining.min(self.config.stripe_height);
			remaining -= height;

			let mut stripe = Stripe::new(width + padding, height)?;
			for y in row..row + height {
				for x in 0..width {
					stripe.push(!src.pixel(x, y))?;
				}
				for _ in 0..padding {
					stripe.push(false)?;
				}
			}
			row += height;

			let frame = stripe.into_frame();
			log::debug!("stripe of {height} rows, {} bytes", frame.len());
			self.send(&frame, 60)?;
			self.throttle.record(height);
		}

		self.send(&FINISH, 5)
	}
}

/// Zero dots appended to each row so the packed width lands on a byte
/// boundary.
fn padding(width: usize) -> usize {
	(8 - width % 8) % 8
}
