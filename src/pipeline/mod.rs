//! Pipeline stages for video-to-deck generation.
//!
//! Each submodule implements one step. The network-facing steps sit behind
//! `async_trait` collaborator traits so [`crate::generate::Generator`] can be
//! driven entirely by in-process fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! metadata ──▶ captions ──▶ llm ──▶ deck ──▶ publish
//! (length,     (timed-text  (title,  (.pptx)  (upload +
//!  captions)    XML)         outline)           record)
//! ```
//!
//! 1. [`metadata`] — length, title and captions URL; fail-soft
//! 2. [`captions`] — download and flatten the timed-text XML; fail-soft
//! 3. [`llm`]      — two prompts over the narration; the outline is the only
//!    hard requirement
//! 4. [`deck`]     — write the OOXML package on the blocking pool
//! 5. [`publish`]  — upload, then insert the presentation record
//!
//! [`input`] normalises user-supplied URLs for front ends and [`extract`]
//! recovers JSON from free-form model output.

pub mod captions;
pub mod deck;
pub mod extract;
pub mod input;
pub mod llm;
pub mod metadata;
pub mod publish;
