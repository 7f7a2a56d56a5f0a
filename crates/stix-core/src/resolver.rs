//! Escalation port for fields the rules cannot settle.
//!
//! A [`Resolver`] answers one [`ResolutionRequest`] at a time, synchronously.
//! It never touches the document: any side effect (such as a corrected
//! street name) comes back as data and the walker applies it.

use std::collections::VecDeque;

use stix_model::{FieldKind, SourcePosition};
use thiserror::Error;

/// Sibling fields shown to the operator alongside the offending value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingContext {
    pub street_number: Option<String>,
    pub street_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub kind: FieldKind,
    pub position: SourcePosition,
    pub original: String,
    /// Why the rules escalated.
    pub reason: String,
    pub context: SiblingContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Replacement value; empty clears the field.
    Value(String),
    /// Skipped or end of input: keep the original and flag it.
    NoReply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub reply: Reply,
    /// Replacement for the sibling `StreetName`, street numbers only.
    pub street_name: Option<String>,
}

impl Resolution {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            reply: Reply::Value(value.into()),
            street_name: None,
        }
    }

    pub fn clear() -> Self {
        Self::value(String::new())
    }

    pub fn no_reply() -> Self {
        Self {
            reply: Reply::NoReply,
            street_name: None,
        }
    }

    pub fn with_street_name(mut self, street_name: impl Into<String>) -> Self {
        self.street_name = Some(street_name.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read operator reply: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot resolve {kind} at {position}: {message}")]
    Unresolvable {
        kind: FieldKind,
        position: SourcePosition,
        message: String,
    },
}

pub trait Resolver {
    fn resolve(&mut self, request: &ResolutionRequest) -> Result<Resolution, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &mut R {
    fn resolve(&mut self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        (**self).resolve(request)
    }
}

/// Declines every request, leaving each escalated field flagged for review.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferResolver;

impl Resolver for DeferResolver {
    fn resolve(&mut self, _request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        Ok(Resolution::no_reply())
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Answer(Resolution),
    Fail(String),
}

/// Replays queued answers in order and records every request it saw.
/// Once the queue is empty it answers [`Reply::NoReply`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    script: VecDeque<Scripted>,
    requests: Vec<ResolutionRequest>,
}

impl ScriptedResolver {
    pub fn new(answers: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            script: answers.into_iter().map(Scripted::Answer).collect(),
            requests: Vec::new(),
        }
    }

    pub fn push(&mut self, answer: Resolution) -> &mut Self {
        self.script.push_back(Scripted::Answer(answer));
        self
    }

    /// Queue a failure for the next request.
    pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.script.push_back(Scripted::Fail(message.into()));
        self
    }

    pub fn requests(&self) -> &[ResolutionRequest] {
        &self.requests
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Resolver for ScriptedResolver {
    fn resolve(&mut self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        self.requests.push(request.clone());
        match self.script.pop_front() {
            Some(Scripted::Answer(resolution)) => Ok(resolution),
            Some(Scripted::Fail(message)) => Err(ResolveError::Unresolvable {
                kind: request.kind,
                position: request.position.clone(),
                message,
            }),
            None => Ok(Resolution::no_reply()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ResolutionRequest {
        ResolutionRequest {
            kind: FieldKind::Unit,
            position: SourcePosition::new(9, "/a/Unit"),
            original: "Apartment B".to_string(),
            reason: "too long".to_string(),
            context: SiblingContext::default(),
        }
    }

    #[test]
    fn scripted_resolver_replays_then_declines() {
        let mut resolver = ScriptedResolver::new([Resolution::value("B")]);
        assert_eq!(
            resolver.resolve(&request()).expect("first").reply,
            Reply::Value("B".to_string())
        );
        assert_eq!(
            resolver.resolve(&request()).expect("second").reply,
            Reply::NoReply
        );
        assert_eq!(resolver.requests().len(), 2);
    }

    #[test]
    fn scripted_failure_carries_position() {
        let mut resolver = ScriptedResolver::default();
        resolver.push_failure("terminal closed");
        let err = resolver.resolve(&request()).expect_err("scripted failure");
        assert_eq!(
            err.to_string(),
            "cannot resolve Unit at line 9: terminal closed"
        );
    }

    #[test]
    fn defer_resolver_never_answers() {
        let mut resolver = DeferResolver;
        assert_eq!(
            resolver.resolve(&request()).expect("defer").reply,
            Reply::NoReply
        );
    }
}
