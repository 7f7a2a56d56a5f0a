//! Terminal prompts for fields the rules cannot settle.
//!
//! One request is shown at a time; the operator types a replacement value.
//! An empty line clears the field and end of input leaves it flagged for
//! manual review.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use stix_core::{Resolution, ResolutionRequest, ResolveError, Resolver};
use stix_model::FieldKind;
use tracing::debug;

use crate::logging::redact_value;

pub struct TerminalResolver<R, W> {
    input: R,
    output: W,
}

impl TerminalResolver<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Next line without its terminator; `None` at end of input.
    fn read_reply(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        self.read_reply()
    }

    fn show(&mut self, request: &ResolutionRequest) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{} at {} needs review: {}",
            request.kind, request.position, request.reason
        )?;
        writeln!(self.output, "  current value: '{}'", request.original)?;
        if let Some(number) = &request.context.street_number
            && request.kind != FieldKind::StreetNumber
        {
            writeln!(self.output, "  street number: '{number}'")?;
        }
        if let Some(name) = &request.context.street_name {
            writeln!(self.output, "  street name:   '{name}'")?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Resolver for TerminalResolver<R, W> {
    fn resolve(&mut self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        self.show(request)?;
        let Some(value) = self.ask("New value (empty to clear, end of input to skip): ")? else {
            writeln!(self.output)?;
            return Ok(Resolution::no_reply());
        };
        debug!(
            kind = %request.kind,
            position = %request.position,
            value = redact_value(&value),
            "operator reply"
        );

        let mut resolution = Resolution::value(value);
        if request.kind == FieldKind::StreetNumber {
            let update = self.ask("Update the street name too? [y/N]: ")?;
            if update.is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
                && let Some(name) = self.ask("New street name: ")?
            {
                resolution = resolution.with_street_name(name);
            }
        }
        Ok(resolution)
    }
}
