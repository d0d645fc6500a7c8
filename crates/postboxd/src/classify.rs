//! Ordered error-to-response rule tables.
//!
//! Each protocol family owns one [`ErrorClassifier`]: an ordered list of
//! [`ErrorRule`]s pairing a predicate over the error with the response action
//! to take and the log line to write. Rules are evaluated top to bottom and
//! the first match wins. Errors no rule matches fall through to the
//! classifier's fallback, which is always logged at error severity.
//!
//! [`ErrorClassifier::resolve`] writes the log line and hands back the action
//! in one synchronous call, so a response is never produced without its log
//! entry or the other way round.

use std::fmt;

use crate::diagnostics::DiagnosticContext;

/// Tracing target for classified failures.
pub(crate) const CLASSIFY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::classify");

/// Severity a rule logs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected rejections clients cause routinely.
    Debug,
    /// Noteworthy but harmless outcomes.
    Info,
    /// Failures an operator may want to look at.
    Warn,
    /// Failures that indicate a fault.
    Error,
}

/// Log line written when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogDirective {
    severity: Severity,
    message: &'static str,
}

impl LogDirective {
    /// Logs `message` at debug level.
    #[must_use]
    pub const fn debug(message: &'static str) -> Self {
        Self {
            severity: Severity::Debug,
            message,
        }
    }

    /// Logs `message` at info level.
    #[must_use]
    pub const fn info(message: &'static str) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }

    /// Logs `message` at warn level.
    #[must_use]
    pub const fn warn(message: &'static str) -> Self {
        Self {
            severity: Severity::Warn,
            message,
        }
    }

    /// Logs `message` at error level.
    #[must_use]
    pub const fn error(message: &'static str) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    /// Severity of the directive.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Message text of the directive.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    fn emit(&self, rule: &str, error: &dyn fmt::Display, context: &DiagnosticContext) {
        let message = self.message;
        match self.severity {
            Severity::Debug => tracing::debug!(
                target: CLASSIFY_TARGET, rule, %error, %context, "{message}"
            ),
            Severity::Info => tracing::info!(
                target: CLASSIFY_TARGET, rule, %error, %context, "{message}"
            ),
            Severity::Warn => tracing::warn!(
                target: CLASSIFY_TARGET, rule, %error, %context, "{message}"
            ),
            Severity::Error => tracing::error!(
                target: CLASSIFY_TARGET, rule, %error, %context, "{message}"
            ),
        }
    }
}

/// One entry of a classification table.
pub struct ErrorRule<E, A> {
    name: &'static str,
    predicate: fn(&E) -> bool,
    action: A,
    log: LogDirective,
}

impl<E, A> ErrorRule<E, A> {
    /// Creates a rule.
    pub const fn new(
        name: &'static str,
        predicate: fn(&E) -> bool,
        action: A,
        log: LogDirective,
    ) -> Self {
        Self {
            name,
            predicate,
            action,
            log,
        }
    }

    /// Rule name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` when the rule applies to `error`.
    pub fn matches(&self, error: &E) -> bool {
        (self.predicate)(error)
    }

    /// Action taken when the rule fires.
    pub const fn action(&self) -> &A {
        &self.action
    }

    /// Log line written when the rule fires.
    pub const fn log(&self) -> LogDirective {
        self.log
    }
}

impl<E, A: fmt::Debug> fmt::Debug for ErrorRule<E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRule")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Name reported for errors handled by the fallback.
pub const FALLBACK_RULE: &str = "fallback";

/// Outcome of [`ErrorClassifier::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<A> {
    /// Name of the rule that fired, or [`FALLBACK_RULE`].
    pub rule: &'static str,
    /// Response action to perform.
    pub action: A,
}

impl<A> Classified<A> {
    /// Returns `true` when no table rule matched.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.rule == FALLBACK_RULE
    }
}

/// Ordered rule table with a mandatory fallback.
#[derive(Debug)]
pub struct ErrorClassifier<E, A> {
    rules: Vec<ErrorRule<E, A>>,
    fallback: A,
    fallback_log: LogDirective,
}

impl<E, A> ErrorClassifier<E, A>
where
    E: fmt::Display,
    A: Clone,
{
    /// Creates a classifier whose unmatched errors resolve to `fallback`.
    pub fn new(rules: Vec<ErrorRule<E, A>>, fallback: A, fallback_message: &'static str) -> Self {
        Self {
            rules,
            fallback,
            fallback_log: LogDirective::error(fallback_message),
        }
    }

    /// Returns the first rule matching `error` without logging.
    pub fn find(&self, error: &E) -> Option<&ErrorRule<E, A>> {
        self.rules.iter().find(|rule| rule.matches(error))
    }

    /// Logs and returns the action for `error`.
    ///
    /// Exactly one log line is written per call: the matched rule's
    /// directive, or the error-level fallback directive.
    pub fn resolve(&self, error: &E, context: &DiagnosticContext) -> Classified<A> {
        match self.find(error) {
            Some(rule) => {
                rule.log.emit(rule.name, error, context);
                Classified {
                    rule: rule.name,
                    action: rule.action.clone(),
                }
            }
            None => {
                self.fallback_log.emit(FALLBACK_RULE, error, context);
                Classified {
                    rule: FALLBACK_RULE,
                    action: self.fallback.clone(),
                }
            }
        }
    }

    /// Names of rules that are never the first match for any of `samples`.
    ///
    /// A rule listed here is either shadowed by an earlier, broader rule or
    /// its intended error kind is missing from `samples`.
    pub fn unreachable_rules(&self, samples: &[E]) -> Vec<&'static str> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                !samples.iter().any(|sample| {
                    self.rules
                        .iter()
                        .position(|rule| rule.matches(sample))
                        .is_some_and(|first| first == *index)
                })
            })
            .map(|(_, rule)| rule.name)
            .collect()
    }

    /// Number of rules in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tracing_test::traced_test;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        Busy,
        Full,
        Broken,
    }

    impl fmt::Display for Fault {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[fixture]
    fn classifier() -> ErrorClassifier<Fault, u16> {
        ErrorClassifier::new(
            vec![
                ErrorRule::new(
                    "busy",
                    |fault| *fault == Fault::Busy,
                    503,
                    LogDirective::debug("resource busy"),
                ),
                ErrorRule::new(
                    "busy-or-full",
                    |fault| matches!(fault, Fault::Busy | Fault::Full),
                    507,
                    LogDirective::warn("resource exhausted"),
                ),
            ],
            500,
            "unexpected fault",
        )
    }

    #[rstest]
    fn first_matching_rule_wins(classifier: ErrorClassifier<Fault, u16>) {
        let classified = classifier.resolve(&Fault::Busy, &DiagnosticContext::new());
        assert_eq!(classified.rule, "busy");
        assert_eq!(classified.action, 503);
    }

    #[rstest]
    fn later_rule_handles_remaining_kinds(classifier: ErrorClassifier<Fault, u16>) {
        let classified = classifier.resolve(&Fault::Full, &DiagnosticContext::new());
        assert_eq!(classified.rule, "busy-or-full");
        assert_eq!(classified.action, 507);
    }

    #[rstest]
    fn unmatched_errors_use_fallback(classifier: ErrorClassifier<Fault, u16>) {
        let classified = classifier.resolve(&Fault::Broken, &DiagnosticContext::new());
        assert!(classified.is_fallback());
        assert_eq!(classified.action, 500);
    }

    #[rstest]
    fn reports_shadowed_rules() {
        let classifier: ErrorClassifier<Fault, u16> = ErrorClassifier::new(
            vec![
                ErrorRule::new(
                    "any",
                    |_| true,
                    500,
                    LogDirective::error("failure"),
                ),
                ErrorRule::new(
                    "full",
                    |fault| *fault == Fault::Full,
                    507,
                    LogDirective::warn("full"),
                ),
            ],
            500,
            "unexpected fault",
        );
        let samples = [Fault::Busy, Fault::Full, Fault::Broken];
        assert_eq!(classifier.unreachable_rules(&samples), vec!["full"]);
    }

    #[rstest]
    #[traced_test]
    fn logs_exactly_once_per_resolution(classifier: ErrorClassifier<Fault, u16>) {
        classifier.resolve(&Fault::Full, &DiagnosticContext::new().with("action", "TEST"));
        logs_assert(|lines: &[&str]| {
            let hits = lines
                .iter()
                .filter(|line| line.contains("resource exhausted"))
                .count();
            if hits == 1 {
                Ok(())
            } else {
                Err(format!("expected one log line, found {hits}"))
            }
        });
        assert!(logs_contain("action=TEST"));
    }

    #[rstest]
    #[traced_test]
    fn fallback_logs_at_error(classifier: ErrorClassifier<Fault, u16>) {
        classifier.resolve(&Fault::Broken, &DiagnosticContext::new());
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("unexpected fault"));
    }
}
