//! Quota refresh orchestration
//!
//! - `controller`: single-flight refresh state machine
//! - `scheduler`: periodic timer driving the controller

pub mod controller;
pub mod scheduler;
