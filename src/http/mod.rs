//! HTTP boundary shared by the catalog client and the favorites synchronizer.
//!
//! All outgoing requests go through the [`HttpClient`] trait so that every
//! component above this module can be exercised against [`MockClient`].

mod client;

pub use client::{HttpClient, MockClient, MockResponse, ReqwestClient};
