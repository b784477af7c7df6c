//! Rule variants the evaluator walks in order.

pub mod band;
