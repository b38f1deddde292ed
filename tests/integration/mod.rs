//! Integration tests for the page shell

mod back_stack;
mod dialog_protocol;
mod multi_provider;
mod page_lifecycle;
mod pairing;
mod script_runner;
