//! Backend API for the Enterprise NotebookLM workspace.
//!
//! Upload documents (CSV, Excel, PDF, HTML, Markdown, DOCX), parse them into
//! bounded text, have a generative model summarize and tag them, chat with
//! the model using selected documents as context, and save or export
//! conversations. State lives in process memory; uploads and transcripts
//! live under an uploads directory.

pub mod ai;
pub mod config;
pub mod error;
pub mod export;
pub mod parser;
pub mod schema;
pub mod server;
pub mod storage;
pub mod store;
