// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to run the interactive sign-up form.
//
// Module responsibilities:
// - `config`: backend base URL and upload timeout from the environment.
// - `api`: HTTP calls to the backend (image upload, individual and
//   company registration) behind the `Backend` trait.
// - `error`: backend error type and its user-facing message.
// - `models`: input records, option sets and request payloads.
// - `preview`: local image loading and preview rendering.
// - `form`: the registration form controller (validation, upload,
//   submission, in-flight guard).
// - `ui`: terminal prompts that drive `form`.
pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod models;
pub mod preview;
pub mod ui;
