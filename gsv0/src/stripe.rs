use thiserror::Error;

/// Largest bitmap the printer accepts in a single raster frame.
pub const MAX_PAYLOAD: usize = 4096;

const GS: u8 = 0x1d;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StripeError {
	/// The width is not a whole number of bytes, or a row would not fit
	/// the header's one-byte width field.
	#[error("invalid raster width: {0} dots")]
	Width(usize),

	/// The packed bitmap would exceed what one frame can carry.
	#[error("stripe does not fit a raster frame: {0} bytes, {1} rows")]
	Capacity(usize, usize),

	/// A dot was pushed past the end of the stripe.
	#[error("bit pushed past the end of the stripe")]
	Overflow,
}

/// One horizontal band of the image, packed row-major with the leftmost
/// dot in the most significant bit of each byte.
///
/// A stripe is write-once: dots go in through [`Stripe::push`] in
/// left-to-right, top-to-bottom order, and the filled stripe is consumed
/// by [`Stripe::into_frame`].
pub struct Stripe {
	byte_width: usize,
	height: usize,
	data: Vec<u8>,
	pos: usize,
}

impl Stripe {
	/// Allocate a stripe of `width` dots by `height` rows. `width` must
	/// already be padded to a byte boundary.
	pub fn new(width: usize, height: usize) -> Result<Self, StripeError> {
		if width % 8 != 0 || width / 8 > 0xff {
			return Err(StripeError::Width(width));
		}

		let byte_width = width / 8;
		let len = byte_width * height;
		if len > MAX_PAYLOAD || height > 0xff {
			return Err(StripeError::Capacity(len, height));
		}

		Ok(Self {
			byte_width,
			height,
			data: vec![0; len],
			pos: 0,
		})
	}

	pub fn byte_width(&self) -> usize {
		self.byte_width
	}

	pub fn height(&self) -> usize {
		self.height
	}

	/// Number of dots the stripe holds.
	pub fn capacity(&self) -> usize {
		self.byte_width * 8 * self.height
	}

	/// Append one dot at the write cursor. `ink` dots print black,
	/// the rest leave the paper blank.
	pub fn push(&mut self, ink: bool) -> Result<(), StripeError> {
		if self.pos >= self.capacity() {
			return Err(StripeError::Overflow);
		}

		if ink {
			self.data[self.pos / 8] |= 0x80 >> (self.pos % 8);
		}
		self.pos += 1;
		Ok(())
	}

	/// Consume the stripe into a `GS v 0` frame: an 8-byte header
	/// followed by the packed bitmap.
	pub fn into_frame(self) -> Vec<u8> {
		let mut frame = Vec::with_capacity(8 + self.data.len());
		frame.extend_from_slice(&[
			GS, b'v', b'0', b'0',
			self.byte_width as u8, 0x00,
			self.height as u8, 0x00,
		]);
		frame.extend_from_slice(&self.data);
		frame
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn packs_msb_first() {
		let mut stripe = Stripe::new(8, 1).unwrap();
		stripe.push(true).unwrap();
		for _ in 0..7 {
			stripe.push(false).unwrap();
		}
		assert_eq!(&stripe.into_frame()[8..], &[0x80]);
	}

	#[test]
	fn packs_all_ink() {
		let mut stripe = Stripe::new(8, 1).unwrap();
		for _ in 0..8 {
			stripe.push(true).unwrap();
		}
		assert_eq!(&stripe.into_frame()[8..], &[0xff]);
	}

	#[test]
	fn packs_rows_in_order() {
		let mut stripe = Stripe::new(8, 2).unwrap();
		for _ in 0..8 {
			stripe.push(true).unwrap();
		}
		for _ in 0..8 {
			stripe.push(false).unwrap();
		}
		assert_eq!(&stripe.into_frame()[8..], &[0xff, 0x00]);
	}

	#[test]
	fn rejects_unaligned_width() {
		assert_eq!(Stripe::new(12, 1).unwrap_err(), StripeError::Width(12));
	}

	#[test]
	fn rejects_width_wider_than_the_header_field() {
		// 2048 dots is 256 bytes per row, one past the u8 width field
		assert_eq!(Stripe::new(2048, 1).unwrap_err(), StripeError::Width(2048));
		assert!(Stripe::new(2040, 1).is_ok());
	}

	#[test]
	fn rejects_oversized_payload() {
		// 200 bytes x 21 rows = 4200 bytes
		assert_eq!(
			Stripe::new(1600, 21).unwrap_err(),
			StripeError::Capacity(4200, 21),
		);
		// exactly at the cap is fine: 128 bytes x 32 rows = 4096
		assert!(Stripe::new(1024, 32).is_ok());
	}

	#[test]
	fn rejects_too_many_rows() {
		assert_eq!(
			Stripe::new(8, 300).unwrap_err(),
			StripeError::Capacity(300, 300),
		);
	}

	#[test]
	fn overflows_when_full() {
		let mut stripe = Stripe::new(8, 1).unwrap();
		for _ in 0..8 {
			stripe.push(false).unwrap();
		}
		assert_eq!(stripe.push(true).unwrap_err(), StripeError::Overflow);
	}

	#[test]
	fn frame_header() {
		let stripe = Stripe::new(512, 32).unwrap();
		let frame = stripe.into_frame();
		assert_eq!(&frame[..8], &[0x1d, 0x76, 0x30, 0x30, 64, 0x00, 32, 0x00]);
		assert_eq!(frame.len(), 8 + 64 * 32);
	}
}
