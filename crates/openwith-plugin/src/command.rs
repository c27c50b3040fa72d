// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Commands the JavaScript side can invoke, parsed from (name, JSON args).

use openwith_core::error::{OpenWithError, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Change the log threshold.
    SetVerbosity(i32),
    /// Replay the host's launch intent through the queue.
    Init,
    /// Register the caller as share event consumer.
    SetHandler,
    /// Register the caller as log sink.
    SetLogger,
    /// Read content behind a URI as base64. Carries the raw file descriptor
    /// object; it is validated on the worker.
    Load(Value),
    /// Send the host to the background.
    Exit,
}

impl Command {
    /// Parse `action` and its argument array. Arity is checked before
    /// anything else so a bad call has no effect.
    pub fn parse(action: &str, args: &[Value]) -> Result<Self> {
        match action {
            "setVerbosity" => {
                expect_arity(action, args, 1)?;
                let level = args[0]
                    .as_i64()
                    .and_then(|level| i32::try_from(level).ok())
                    .ok_or_else(|| {
                        OpenWithError::invalid_action(action, format!("not an integer: {}", args[0]))
                    })?;
                Ok(Self::SetVerbosity(level))
            }
            "init" => expect_arity(action, args, 0).map(|_| Self::Init),
            "setHandler" => expect_arity(action, args, 0).map(|_| Self::SetHandler),
            "setLogger" => expect_arity(action, args, 0).map(|_| Self::SetLogger),
            "load" => {
                expect_arity(action, args, 1)?;
                Ok(Self::Load(args[0].clone()))
            }
            "exit" => expect_arity(action, args, 0).map(|_| Self::Exit),
            other => Err(OpenWithError::UnknownAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetVerbosity(_) => "setVerbosity",
            Self::Init => "init",
            Self::SetHandler => "setHandler",
            Self::SetLogger => "setLogger",
            Self::Load(_) => "load",
            Self::Exit => "exit",
        }
    }
}

fn expect_arity(action: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(OpenWithError::invalid_action(
            action,
            format!("expected {expected} argument(s), got {}", args.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_command() {
        assert_eq!(
            Command::parse("setVerbosity", &[json!(20)]).expect("parse"),
            Command::SetVerbosity(20)
        );
        assert_eq!(Command::parse("init", &[]).expect("parse"), Command::Init);
        assert_eq!(Command::parse("setHandler", &[]).expect("parse"), Command::SetHandler);
        assert_eq!(Command::parse("setLogger", &[]).expect("parse"), Command::SetLogger);
        assert_eq!(Command::parse("exit", &[]).expect("parse"), Command::Exit);

        let descriptor = json!({ "uri": "content://x" });
        assert_eq!(
            Command::parse("load", std::slice::from_ref(&descriptor)).expect("parse"),
            Command::Load(descriptor)
        );
    }

    #[test]
    fn wrong_arity_is_invalid() {
        for (action, args) in [
            ("setVerbosity", vec![]),
            ("setVerbosity", vec![json!(1), json!(2)]),
            ("init", vec![json!(1)]),
            ("setHandler", vec![json!(null)]),
            ("setLogger", vec![json!("x")]),
            ("load", vec![]),
            ("exit", vec![json!(true)]),
        ] {
            let err = Command::parse(action, &args).unwrap_err();
            assert!(
                matches!(err, OpenWithError::InvalidAction { .. }),
                "{action} with {args:?} should be invalid"
            );
        }
    }

    #[test]
    fn verbosity_must_be_an_integer() {
        assert!(Command::parse("setVerbosity", &[json!("loud")]).is_err());
        assert!(Command::parse("setVerbosity", &[json!(1.5)]).is_err());
        assert!(Command::parse("setVerbosity", &[json!(i64::MAX)]).is_err());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = Command::parse("share", &[]).unwrap_err();
        assert!(matches!(err, OpenWithError::UnknownAction(name) if name == "share"));
    }

    #[test]
    fn names_round_trip_through_parse() {
        for command in [Command::Init, Command::SetHandler, Command::SetLogger, Command::Exit] {
            assert_eq!(Command::parse(command.name(), &[]).expect("parse"), command);
        }
    }
}
