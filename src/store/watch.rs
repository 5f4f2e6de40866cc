//! Push-based change feeds. Every delivery carries the full current snapshot;
//! subscribers replace their local copy instead of patching it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Listeners<T> {
  next_id: u64,
  entries: Vec<(u64, Callback<T>)>,
}

pub struct Hub<T> {
  listeners: Rc<RefCell<Listeners<T>>>,
}

impl<T: 'static> Default for Hub<T> {
  fn default() -> Self {
    Self {
      listeners: Rc::new(RefCell::new(Listeners {
        next_id: 0,
        entries: Vec::new(),
      })),
    }
  }
}

impl<T: 'static> Hub<T> {
  pub fn subscribe<F>(&self, callback: F) -> Subscription
  where
    F: FnMut(&T) + 'static,
  {
    let mut listeners = self.listeners.borrow_mut();
    let id = listeners.next_id;
    listeners.next_id += 1;
    listeners
      .entries
      .push((id, Rc::new(RefCell::new(callback)) as Callback<T>));

    let weak: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.listeners);
    Subscription {
      cancel: Some(Box::new(move || {
        if let Some(listeners) = weak.upgrade() {
          listeners.borrow_mut().entries.retain(|(entry, _)| *entry != id);
        }
      })),
    }
  }

  /// Delivers `value` to every live subscriber. Subscribers may cancel
  /// (their own or other) subscriptions from inside the callback.
  pub fn publish(&self, value: &T) {
    let snapshot: Vec<(u64, Callback<T>)> = self.listeners.borrow().entries.clone();
    for (id, callback) in snapshot {
      let still_live = self
        .listeners
        .borrow()
        .entries
        .iter()
        .any(|(entry, _)| *entry == id);
      if !still_live {
        continue;
      }
      if let Ok(mut callback) = callback.try_borrow_mut() {
        (*callback)(value);
      }
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.listeners.borrow().entries.len()
  }
}

/// Handle returned by [`Hub::subscribe`]. Dropping it cancels delivery.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
  cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
  pub fn cancel(mut self) {
    self.run_cancel();
  }

  fn run_cancel(&mut self) {
    if let Some(cancel) = self.cancel.take() {
      cancel();
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.run_cancel();
  }
}
