//! Integration tests driving the services against the in-memory store and,
//! when run with `--ignored`, a live Postgres

mod imports;
mod postgres;
mod stats;
mod visits;
