//! Message handlers.
//!
//! Each module adds `impl App` blocks for one area of the window.

mod browse;
mod engine;
mod result;
mod window;
