//! Documentation tooltips for symbols hovered in an embedded code editor.
//!
//! A [`Session`] resolves the token under the pointer, looks its record up
//! through a [`LookupCache`] backed by a tiered [`DocStore`], and drives a
//! host-provided [`TooltipSurface`].

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod normalize;
pub mod presenter;
pub mod resolver;
pub mod session;
pub mod store;
pub mod tracing;
pub mod types;

pub use cache::LookupCache;
pub use config::Config;
pub use error::{ConfigError, StoreError};
pub use format::TooltipContent;
pub use geometry::{Point, Rect, Size, Viewport};
pub use presenter::{HoverOutcome, Presenter, Ticket, TooltipState, TooltipSurface};
pub use resolver::{HostNode, ResolvedToken, Selector, TokenResolver};
pub use session::{KeyEvent, PointerEvent, Session};
pub use store::{
    DatasetSource, DocStore, FileSource, FsPartitionStore, MemoryPartitionStore, Partition,
    PartitionStore, StaticSource,
};
pub use types::{DocRecord, ParamDoc, ReturnDoc, SymbolKey};
