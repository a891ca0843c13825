//! ranq - Q-learning supplier ranking engine
//!
//! Learns, through reinforcement feedback, which advisory action (tier
//! placement, volume adjustment, audit flag, improvement request) fits a
//! supplier's discretized performance profile, and synthesizes a totally
//! ordered, persisted supplier ranking from the learned policy.

pub mod action;
pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod qtable;
pub mod ranking;
pub mod reward;
pub mod state;
pub mod storage;

pub use error::{RanqError, Result};
