// SPDX-License-Identifier: MIT

//! Nano Banana studio: prompt-driven image generation and editing, plus a
//! small node-graph workflow canvas, on top of the Gemini image API.

pub mod banana;
pub mod genai;
