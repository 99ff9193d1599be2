#![allow(dead_code)]

pub mod bounded;
pub mod tester;
