#![forbid(unsafe_code)]

pub mod ids;
pub mod ranked;

pub use ranked::{
    CollectionKind, CollectionSpec, RankedCollectionManager, RankedError, RankedItem, RankedRows,
};
