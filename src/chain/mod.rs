//! Chain of responsibility with resumable deferral.
//!
//! ## Contents
//! - [`HandlerChain`] ordered handlers, dispatch / resume / abandon
//! - [`Handler`], [`HandlerFn`] the per-step contract and its closure adapter
//! - [`Cx`] per-step context: dispatch context access and [`Cx::defer`]
//! - [`Outcome`] what a handler decided, [`Dispatch`] what a call returned
//! - [`NodeRef`] shared node handle, entry point for `dispatch_from`
//! - [`ResumeToken`] single-use handle of one suspension

mod handler;
mod handler_chain;
mod node;
mod outcome;
mod token;

pub use handler::{Cx, Handler, HandlerFn};
pub use handler_chain::HandlerChain;
pub use node::NodeRef;
pub use outcome::{Dispatch, Outcome};
pub use token::ResumeToken;
