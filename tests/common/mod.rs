#![allow(dead_code)]

pub mod failing_store;
pub mod scenarios;
