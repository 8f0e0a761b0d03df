use std::time::Duration;

/// Strategy for idling the print head during a cooldown.
pub trait Pause {
	fn pause(&mut self, duration: Duration);
}

/// Blocks the calling thread for the full cooldown.
pub struct Sleep;

impl Pause for Sleep {
	fn pause(&mut self, duration: Duration) {
		std::thread::sleep(duration);
	}
}

/// Paces stripe emission so the print head gets a chance to cool off.
///
/// Thermal heads smear when they run too long without a break. The
/// throttle counts printed rows and pauses once the count passes a
/// threshold, then starts counting from zero again. The threshold is
/// measured in rows, not frames or elapsed time.
pub struct Throttle {
	rows: usize,
	every: usize,
	cooldown: Duration,
	pause: Box<dyn Pause>,
}

impl Throttle {
	pub fn new(every: usize, cooldown: Duration) -> Self {
		Self::with_pause(every, cooldown, Sleep)
	}

	pub fn with_pause(every: usize, cooldown: Duration, pause: impl Pause + 'static) -> Self {
		Self {
			rows: 0,
			every,
			cooldown,
			pause: Box::new(pause),
		}
	}

	/// Clear the row counter at the start of a job.
	pub fn reset(&mut self) {
		self.rows = 0;
	}

	/// Account for `rows` freshly printed rows, pausing if the running
	/// total has passed the threshold.
	pub fn record(&mut self, rows: usize) {
		self.rows += rows;
		if self.rows > self.every {
			log::debug!("cooling down for {:?} after {} rows", self.cooldown, self.rows);
			self.pause.pause(self.cooldown);
			self.rows = 0;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[derive(Clone, Default)]
	struct Recorder(Rc<RefCell<Vec<Duration>>>);

	impl Pause for Recorder {
		fn pause(&mut self, duration: Duration) {
			self.0.borrow_mut().push(duration);
		}
	}

	#[test]
	fn pauses_once_past_the_threshold() {
		let pauses = Recorder::default();
		let mut throttle = Throttle::with_pause(1000, Duration::from_secs(2), pauses.clone());

		for _ in 0..31 {
			throttle.record(32);
		}
		// 992 rows, still under
		assert!(pauses.0.borrow().is_empty());

		throttle.record(32);
		// 1024 rows
		assert_eq!(*pauses.0.borrow(), vec![Duration::from_secs(2)]);
	}

	#[test]
	fn restarts_the_count_after_pausing() {
		let pauses = Recorder::default();
		let mut throttle = Throttle::with_pause(1000, Duration::from_millis(1), pauses.clone());

		for _ in 0..32 {
			throttle.record(32);
		}
		assert_eq!(pauses.0.borrow().len(), 1);

		for _ in 0..31 {
			throttle.record(32);
		}
		assert_eq!(pauses.0.borrow().len(), 1);

		throttle.record(32);
		assert_eq!(pauses.0.borrow().len(), 2);
	}

	#[test]
	fn exactly_the_threshold_does_not_pause() {
		let pauses = Recorder::default();
		let mut throttle = Throttle::with_pause(1000, Duration::from_secs(1), pauses.clone());

		throttle.record(1000);
		assert!(pauses.0.borrow().is_empty());

		throttle.record(1);
		assert_eq!(pauses.0.borrow().len(), 1);
	}

	#[test]
	fn reset_clears_the_counter() {
		let pauses = Recorder::default();
		let mut throttle = Throttle::with_pause(100, Duration::from_secs(1), pauses.clone());

		throttle.record(100);
		throttle.reset();
		throttle.record(100);
		assert!(pauses.0.borrow().is_empty());
	}
}
