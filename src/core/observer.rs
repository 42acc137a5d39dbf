//! Observers receiving configuration values.

use std::marker::PhantomData;
use std::sync::Arc;

/// A passive sink for configuration values.
///
/// `on_next` is called once at subscribe time if a value exists, then once per
/// successful reload. `on_complete` is called exactly once when the cell is
/// disposed; no calls follow it.
///
/// Implementations should not panic. If one does, the panic is caught and logged
/// and delivery continues with the next observer.
pub trait Observer<T>: Send + Sync {
    /// Receive the current configuration value.
    fn on_next(&self, value: Arc<T>);

    /// The cell was disposed.
    fn on_complete(&self) {}
}

/// Observer backed by a closure.
///
/// # Examples
///
/// ```rust
/// use live_config::core::{FnObserver, Observer};
/// use std::sync::Arc;
///
/// let observer = FnObserver::new(|port: Arc<u16>| println!("port is now {}", port));
/// observer.on_next(Arc::new(8080));
/// ```
pub struct FnObserver<T, F> {
    on_next: F,
    _marker: PhantomData<fn(Arc<T>)>,
}

impl<T, F> FnObserver<T, F>
where
    F: Fn(Arc<T>) + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(on_next: F) -> Self {
        Self {
            on_next,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Observer<T> for FnObserver<T, F>
where
    F: Fn(Arc<T>) + Send + Sync,
{
    fn on_next(&self, value: Arc<T>) {
        (self.on_next)(value)
    }
}

#[cfg(feature = "tokio")]
pub use channel::ChannelObserver;

#[cfg(feature = "tokio")]
mod channel {
    use super::Observer;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Observer forwarding values into a tokio channel.
    ///
    /// The sender is dropped on completion, so the receiving side sees the
    /// channel close once the cell is disposed.
    pub struct ChannelObserver<T> {
        tx: Mutex<Option<mpsc::UnboundedSender<Arc<T>>>>,
    }

    impl<T> ChannelObserver<T> {
        /// Create the observer and its receiving end.
        pub fn new() -> (Self, mpsc::UnboundedReceiver<Arc<T>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Self {
                    tx: Mutex::new(Some(tx)),
                },
                rx,
            )
        }
    }

    impl<T: Send + Sync> Observer<T> for ChannelObserver<T> {
        fn on_next(&self, value: Arc<T>) {
            if let Some(tx) = self.tx.lock().as_ref() {
                // A closed receiver just means nobody listens any more.
                let _ = tx.send(value);
            }
        }

        fn on_complete(&self) {
            self.tx.lock().take();
        }
    }
}
