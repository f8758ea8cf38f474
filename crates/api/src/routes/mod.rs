//! HTTP Route Handlers

pub mod alerts;
pub mod evaluate;
pub mod rules;
