#![allow(dead_code)]
use brrtbind::BindParams;

#[derive(Default, BindParams)]
struct Pair(u64, u64);

fn main() {}
