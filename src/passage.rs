//! Passage records and the immutable passage store.
//!
//! Passages are produced by an upstream ingestion step (chunking is out of
//! scope here). This module holds them in a [`store::PassageStore`] whose index
//! positions are the join key used by the lexical and vector indexes.
//!
//! # Core Components
//!
//! - [`store::Passage`] - One retrievable unit of text with its metadata
//! - [`store::PassageStore`] - Ordered, immutable collection of passages
//! - [`source::SourceFilter`] - Per-session source selection with the rule-book override
//! - [`jsonl`] - Loading passages from JSON Lines files
//!
//! # Examples
//!
//! ```
//! use lorekeeper::passage::store::{Passage, PassageStore};
//!
//! let store = PassageStore::new(vec![
//!     Passage::new("r_0001", "The goblin swings its scimitar.", "combat"),
//!     Passage::new("r_0002", "The road winds north to Phandalin.", "location"),
//! ]);
//!
//! assert_eq!(store.len(), 2);
//! assert_eq!(store.get(1).unwrap().id, "r_0002");
//! ```

pub mod jsonl;
pub mod source;
pub mod store;

pub use self::source::SourceFilter;
pub use self::store::{Passage, PassageStore};
