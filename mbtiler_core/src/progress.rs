//! Progress reporting for long running loops.
//!
//! Operations never print progress themselves. They receive a `&mut dyn ProgressSink` and push
//! snapshots through a [`ProgressCounter`]; the sink decides what to do with them.
//!
//! ```
//! use mbtiler_core::progress::*;
//!
//! let mut sink = LogProgress::every(100);
//! let mut counter = ProgressCounter::new("extracting tiles", Some(250), &mut sink);
//! for _ in 0..250 {
//! 	counter.inc(1);
//! }
//! assert_eq!(counter.finish(), 250);
//! ```

/// Receives progress snapshots.
pub trait ProgressSink {
	fn update(&mut self, task: &str, done: u64, total: Option<u64>);

	fn finish(&mut self, task: &str, done: u64) {
		let _ = (task, done);
	}
}

/// Logs every `interval` items at info level, and once more when the task finishes.
#[derive(Clone, Debug)]
pub struct LogProgress {
	interval: u64,
}

impl LogProgress {
	pub fn every(interval: u64) -> LogProgress {
		LogProgress {
			interval: interval.max(1),
		}
	}
}

impl Default for LogProgress {
	fn default() -> Self {
		LogProgress::every(100)
	}
}

impl ProgressSink for LogProgress {
	fn update(&mut self, task: &str, done: u64, total: Option<u64>) {
		if done % self.interval != 0 {
			return;
		}
		match total {
			Some(total) => log::info!("{task}: {done}/{total}"),
			None => log::info!("{task}: {done}"),
		}
	}

	fn finish(&mut self, task: &str, done: u64) {
		log::info!("{task}: finished after {done} items");
	}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
	fn update(&mut self, _task: &str, _done: u64, _total: Option<u64>) {}
}

/// Counts items of one task and forwards each step to a [`ProgressSink`].
pub struct ProgressCounter<'a> {
	task: String,
	done: u64,
	total: Option<u64>,
	sink: &'a mut dyn ProgressSink,
}

impl<'a> ProgressCounter<'a> {
	pub fn new(task: &str, total: Option<u64>, sink: &'a mut dyn ProgressSink) -> ProgressCounter<'a> {
		ProgressCounter {
			task: task.to_string(),
			done: 0,
			total,
			sink,
		}
	}

	pub fn inc(&mut self, delta: u64) {
		self.done += delta;
		self.sink.update(&self.task, self.done, self.total);
	}

	pub fn done(&self) -> u64 {
		self.done
	}

	/// Reports completion and returns the number of counted items.
	pub fn finish(self) -> u64 {
		self.sink.finish(&self.task, self.done);
		self.done
	}
}
