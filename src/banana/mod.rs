// SPDX-License-Identifier: MIT

pub mod config;
pub mod error;
pub mod server;
pub mod studio;
pub mod workflow;
