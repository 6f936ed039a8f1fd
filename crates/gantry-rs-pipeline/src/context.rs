//! Per-request execution state.
//!
//! A [`RequestContext`] owns the parsed request, a cursor into the compacted
//! handler chain, and a shared terminal slot that accepts exactly one
//! response. Handlers advance the chain with [`RequestContext::next`] and
//! finish it by returning a terminal outcome or by calling
//! [`RequestContext::send`] / [`RequestContext::send_error`] directly.

use std::sync::{Arc, Mutex, PoisonError};

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::json;

use gantry_rs_core::{AppError, ErrorOutcome};
use gantry_rs_http::{GetOptions, Request, Response, ResponseMapper};

use crate::handler::{Handler, HandlerFuture};

/// Boot-time state shared by every request of an application: the response
/// mapper the pipeline resolves outcomes through, and the debug flag that
/// controls stack exposure in error bodies.
#[derive(Debug)]
pub(crate) struct PipelineState {
    pub mapper: Arc<ResponseMapper>,
    pub debug: bool,
}

/// The mutable context threaded through a handler chain.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    chain: Arc<[Handler]>,
    cursor: usize,
    next_aborted: bool,
    errors: Vec<AppError>,
    extra_headers: HeaderMap,
    terminal: Arc<Mutex<Option<Response>>>,
    state: Arc<PipelineState>,
}

impl RequestContext {
    pub(crate) fn new(request: Request, chain: Arc<[Handler]>, state: Arc<PipelineState>) -> Self {
        Self {
            request,
            chain,
            cursor: 0,
            next_aborted: false,
            errors: Vec::new(),
            extra_headers: HeaderMap::new(),
            terminal: Arc::new(Mutex::new(None)),
            state,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Runs the rest of the chain, starting at the cursor.
    ///
    /// Every remaining handler is driven from here, so a wrapper that awaits
    /// this future observes the entire downstream — including handlers that
    /// fall through without calling `next` themselves. Terminal outcomes are
    /// written here, so the awaited value is always `Ok(None)`; middleware
    /// that needs to react to the downstream result should inspect
    /// [`Self::response_status`] or [`Self::errors`] after the await. Once a
    /// terminal response has been written, further calls are no-ops.
    pub fn next(&mut self) -> HandlerFuture<'_> {
        Box::pin(async move {
            while !self.next_aborted && self.cursor < self.chain.len() {
                let handler = self.chain[self.cursor].clone();
                self.cursor += 1;
                match handler.call(&mut *self).await {
                    Ok(Some(response)) => self.send(response),
                    Ok(None) => {}
                    Err(error) => self.send_error(error),
                }
            }
            Ok(None)
        })
    }

    /// Writes a success response, filling any fields the handler left unset
    /// from the mapper's success defaults, and aborts the chain.
    pub fn send(&mut self, mut response: Response) {
        let defaults = self.state.mapper.get_success();
        response.compose(&defaults, false);
        self.write(response);
    }

    /// Resolves an error outcome through the response mapper, records the
    /// structured error, writes the resulting response, and aborts the chain.
    ///
    /// Errors that resolve to the mapper's internal-error status are logged
    /// at error level; everything else is the caller's outcome, not a fault.
    pub fn send_error(&mut self, outcome: impl Into<ErrorOutcome>) {
        let error = outcome.into().into_app_error();
        let mut response = self
            .state
            .mapper
            .get(error.code(), GetOptions::default());
        response.compose_body(&json!({ "errors": [error.to_json(self.state.debug)] }));
        if response.effective_status() == self.state.mapper.internal_error_status() {
            tracing::error!(
                target: "gantry::context",
                code = error.code(),
                error = %error,
                "request failed with an internal error"
            );
        }
        self.errors.push(error);
        self.write(response);
    }

    /// Stages a response header that will be applied to whatever terminal
    /// response is eventually written, unless that response already carries
    /// the header itself.
    pub fn stage_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.extra_headers.append(name, value);
    }

    /// Errors recorded on this context so far, oldest first.
    pub fn errors(&self) -> &[AppError] {
        &self.errors
    }

    /// Whether a terminal outcome has aborted the current chain.
    pub fn aborted(&self) -> bool {
        self.next_aborted
    }

    /// Status of the terminal response, if one has been written.
    pub fn response_status(&self) -> Option<StatusCode> {
        self.terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Response::effective_status)
    }

    /// Detaches an independent copy of this context for use outside the
    /// chain's borrow, e.g. from a spawned task. The copy shares the
    /// terminal slot, so whichever side writes first wins; its chain is
    /// already exhausted and its error list starts empty.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            request: self.request.clone(),
            chain: Arc::clone(&self.chain),
            cursor: self.chain.len(),
            next_aborted: self.next_aborted,
            errors: Vec::new(),
            extra_headers: self.extra_headers.clone(),
            terminal: Arc::clone(&self.terminal),
            state: Arc::clone(&self.state),
        }
    }

    /// Swaps in the post-dispatch chain and rearms the cursor. Postware runs
    /// to observe the finished request; the terminal slot stays write-once,
    /// so it cannot replace the response.
    pub(crate) fn install_post_chain(&mut self, chain: Arc<[Handler]>) {
        self.chain = chain;
        self.cursor = 0;
        self.next_aborted = false;
    }

    pub(crate) fn finished(&self) -> bool {
        self.next_aborted || self.cursor >= self.chain.len()
    }

    pub(crate) fn take_terminal(&self) -> Option<Response> {
        self.terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn write(&mut self, mut response: Response) {
        self.next_aborted = true;
        for (name, value) in &self.extra_headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }
        let mut slot = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::debug!(
                target: "gantry::context",
                "terminal response already written, dropping the second one"
            );
            return;
        }
        *slot = Some(response);
    }
}
