// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SecondLook: buy-or-pass advice for secondhand furniture
//!
//! Photos, asking price and notes go to a hosted vision model; the answer is
//! validated into a typed assessment whose confidence tiers can be raised
//! locally by answering follow-up questions.

pub mod advisor;
pub mod assessment;
pub mod config;
pub mod error;
pub mod openai;
pub mod photo;
pub mod prompts;
pub mod session;
pub mod web;

pub use config::AppConfig;
pub use error::{Result, SecondLookError};
