//! PicWitness Common Library
//!
//! CLIと同期コントローラで共有される型とビューヘルパー

pub mod types;
pub mod view;
pub mod render;
pub mod error;

pub use types::{Account, ContentId, Item, ItemDetails, TxReceipt};
pub use view::{Phase, ResolutionGap, ViewState};
pub use render::{ItemView, DEFAULT_GATEWAY_BASE, format_added_on, gateway_url, render_items};
pub use error::{Error, Result};
