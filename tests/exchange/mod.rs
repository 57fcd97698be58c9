//! Integration tests for the single-exchange core

mod support;

mod emitter;
mod tls;
