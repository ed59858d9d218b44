//! Background tasks owned by cache entries.

pub(crate) mod refresh;
