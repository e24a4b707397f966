//! Command handlers for the loopback-oauth CLI

pub mod auth;
