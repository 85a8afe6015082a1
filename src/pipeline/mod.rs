//! Pipeline stages and external collaborators.
//!
//! Each submodule owns exactly one boundary with the outside world, so the
//! session logic can be tested with stubs and any backend can be swapped
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ DocumentStore ──▶ context ──▶ llm / groq
//! (path/URL)  (pdfium)                    (sampling)   (generation)
//!                           │
//!                           └──────────▶ translate
//!                                        (per page)
//! ```
//!
//! 1. [`input`]: canonicalise a user-supplied path or URL to PDF bytes
//! 2. [`extract`]: page-indexed text via pdfium; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`llm`]: the [`llm::Generator`] boundary and provider resolution
//! 4. [`groq`]: the default generator, Groq's OpenAI-compatible endpoint
//! 5. [`translate`]: the [`translate::Translator`] boundary, Google
//!    Translate client, and per-page isolated translation

pub mod extract;
pub mod groq;
pub mod input;
pub mod llm;
pub mod translate;
