pub mod listeners;
pub mod protocol;

pub use listeners::{DataListener, ErrorListener, ListenerId, Listeners};

/// A byte-stream collaborator that delivers delimited frames and stream errors
/// to subscribed listeners.
///
/// Subscriptions may be registered before `open()`; notifications start once
/// the underlying stream is open.
pub trait FrameSource {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn is_open(&self) -> bool;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Registry the source dispatches into.
    fn listeners(&self) -> &Listeners;

    fn on_data(&self, listener: DataListener) -> ListenerId {
        self.listeners().on_data(listener)
    }

    fn on_error(&self, listener: ErrorListener) -> ListenerId {
        self.listeners().on_error(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners().remove(id)
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }

    fn listeners(&self) -> &Listeners {
        (**self).listeners()
    }
}
