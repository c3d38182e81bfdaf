#![forbid(unsafe_code)]

mod counters;
mod migrate;
mod news_tx;

pub(super) use counters::*;
pub(super) use migrate::*;
pub(super) use news_tx::*;
