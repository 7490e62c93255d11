//! End-to-end tests wiring the engine against in-memory fakes and a
//! SQLite cache.

mod api;
mod fake_source;
mod pipeline;
mod storage;
