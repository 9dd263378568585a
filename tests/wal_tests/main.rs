//! WAL test suite

mod reader_tests;
mod writer_tests;
