//! Derived values that follow a context
//!
//! A [`Computation`] evaluates a function of the context once on creation
//! and again after every context notification. Observers registered with
//! [`Computation::on_change`] are called when the value actually changes.

use annota_context::{Context, SubscriptionId, WeakContext};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct State<T> {
    value: RwLock<T>,
    observers: Mutex<Vec<Observer<T>>>,
}

impl<T> State<T>
where
    T: Clone + PartialEq,
{
    fn set(&self, next: T) {
        {
            let mut value = self.value.write();
            if *value == next {
                return;
            }
            *value = next.clone();
        }
        let observers: Vec<Observer<T>> = self.observers.lock().iter().cloned().collect();
        for observer in observers {
            observer(&next);
        }
    }
}

/// A value derived from a context, kept up to date
pub struct Computation<T> {
    context: Context,
    subscription: SubscriptionId,
    state: Arc<State<T>>,
}

impl<T> Computation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Evaluate `f` now and after every change of `context`
    pub fn new<F>(context: &Context, f: F) -> Self
    where
        F: Fn(&Context) -> T + Send + Sync + 'static,
    {
        let state = Arc::new(State {
            value: RwLock::new(f(context)),
            observers: Mutex::new(Vec::new()),
        });
        let weak: WeakContext = context.downgrade();
        let listener_state = Arc::clone(&state);
        let subscription = context.subscribe(move || {
            if let Some(context) = weak.upgrade() {
                listener_state.set(f(&context));
            }
        });
        Computation {
            context: context.clone(),
            subscription,
            state,
        }
    }

    /// Latest value
    pub fn get(&self) -> T {
        self.state.value.read().clone()
    }

    /// Call `observer` with every new value
    pub fn on_change(&self, observer: impl Fn(&T) + Send + Sync + 'static) {
        self.state.observers.lock().push(Arc::new(observer));
    }
}

impl<T> Drop for Computation<T> {
    fn drop(&mut self) {
        self.context.unsubscribe(self.subscription);
    }
}

impl<T: fmt::Debug> fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("value", &*self.state.value.read())
            .finish()
    }
}
