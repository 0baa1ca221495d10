// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Provider and session contracts.
//!
//! A [`Provider`] opens [`Session`]s; a session is one open conversation
//! with a model and owns the provider-side cursor that the neutral
//! [`confab_history::History`] mirrors.  Sessions generate either blocking
//! (`generate` → one [`Response`]) or streaming (`generate_stream` → a
//! [`SessionStream`] of [`StreamEvent`]s that the caller assembles).
//!
//! The [`mock`] module ships deterministic scripted providers for tests —
//! no network, exact event sequences, inspectable session histories.

mod provider;
mod session;

pub mod mock;

pub use provider::Provider;
pub use session::{
    message_from_response, messages_from_inputs, ContentType, Input, Response, Session,
    SessionOptions, SessionStream, StreamEvent, ToolCallRequest,
};
