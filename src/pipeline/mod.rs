//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. another highlighter or PDF engine) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ toc ──▶ fences ──▶ placeholder ──▶ markdown ──▶ postprocess ──▶ embed ──▶ render
//! (paths)  ([TOC])  (pairing)   (shield)      (pulldown)    (restore)     (base64)  (Chrome)
//! ```
//!
//! 1. [`input`]: expand globs, validate Markdown paths, read and merge text
//! 2. [`toc`]: expand `[TOC]` markers; owns the heading [`toc::Slugger`]
//! 3. [`fences`]: find fence lines and pair them with an explicit stack
//! 4. [`placeholder`]: shield interior fences so the renderer cannot close
//!    the outer block early, and restore them afterwards
//! 5. [`markdown`]: pulldown-cmark rendering with [`highlight`] callbacks
//! 6. [`postprocess`]: placeholder restore, strikethrough, task lists
//! 7. [`embed`]: inline local images as data URIs
//! 8. [`render`]: print the HTML with headless Chrome; runs in
//!    `spawn_blocking` because the DevTools client is synchronous

pub mod embed;
pub mod fences;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod placeholder;
pub mod postprocess;
pub mod render;
pub mod toc;
