//! The live configuration cell and its observer plumbing.

mod builder;
mod cell;
mod observer;
mod section_key;
mod subscription;

#[cfg(feature = "validation")]
mod validation;

pub use builder::LiveConfigCellBuilder;
pub use cell::{ConfigAccessor, ConfigObservable, LiveConfigCell, ReloadStats};
pub use observer::{FnObserver, Observer};
pub use section_key::SectionKey;
pub use subscription::Subscription;

#[cfg(feature = "tokio")]
pub use observer::ChannelObserver;

#[cfg(feature = "validation")]
pub use validation::Validate;
