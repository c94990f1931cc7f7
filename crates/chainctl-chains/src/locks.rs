// SPDX-License-Identifier: GPL-3.0

use crate::naming::ChainKey;
use std::{
	collections::HashMap,
	sync::{Arc, Mutex, PoisonError},
};

/// Serializes the transitions of each chain instance within the process.
#[derive(Default)]
pub struct ChainLocks {
	locks: Mutex<HashMap<ChainKey, Arc<Mutex<()>>>>,
}

impl ChainLocks {
	fn lock_for(&self, key: &ChainKey) -> Arc<Mutex<()>> {
		let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
		locks.entry(key.clone()).or_default().clone()
	}

	/// Runs `f` while holding the lock of `key`.
	pub fn with<T>(&self, key: &ChainKey, f: impl FnOnce() -> T) -> T {
		let lock = self.lock_for(key);
		let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
		f()
	}

	/// Runs `f` while holding the locks of both keys, acquired in a consistent order.
	pub fn with_pair<T>(&self, a: &ChainKey, b: &ChainKey, f: impl FnOnce() -> T) -> T {
		if a == b {
			return self.with(a, f);
		}
		let (first, second) = if a < b { (a, b) } else { (b, a) };
		let first = self.lock_for(first);
		let second = self.lock_for(second);
		let _first = first.lock().unwrap_or_else(PoisonError::into_inner);
		let _second = second.lock().unwrap_or_else(PoisonError::into_inner);
		f()
	}
}
