//! Path-filter expression parsing and SQL translation.
//!
//! The filter mini-language selects documents by field-path equality over
//! their JSON content:
//!
//! ```text
//! $ ? (@.title == "Hello!" && @.author.givenName == "John")
//! ```
//!
//! Grammar:
//!
//! ```text
//! expression := '$' '?' '(' predicate ')'
//! predicate  := condition ( '&&' condition )*
//! condition  := '@' '.' segment ( '.' segment )* '==' string
//! segment    := [A-Za-z0-9_-]+
//! string     := '"' characters with backslash escapes '"'
//! ```
//!
//! Parsing produces a typed condition tree; translation to SQL binds every
//! path and literal as a parameter. User input is never concatenated into
//! query text, so there is no injection surface.

use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, trace};

use crate::{Result, VaultError};

/// A single field-path equality condition: `@.a.b == "literal"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCondition {
    /// Path segments from the document root, outermost first.
    pub path:  Vec<String>,
    /// The string literal the field must equal.
    pub value: String,
}

/// A parsed filter expression: the conjunction of its conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    /// All conditions; a document matches when every one holds.
    pub conditions: Vec<PathCondition>,
}

impl PathFilter {
    /// Parses a filter expression string into a typed condition tree.
    ///
    /// # Arguments
    ///
    /// * `expression` - The filter expression, rooted at `$`.
    ///
    /// # Returns
    ///
    /// Returns the parsed `PathFilter`, or `VaultError::InvalidFilterExpression`
    /// when the expression deviates from the grammar in any way. The error
    /// carries the offending expression and the reason for rejection.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jsonvault::PathFilter;
    ///
    /// let filter = PathFilter::parse(r#"$ ? (@.title == "Hello!")"#).unwrap();
    /// assert_eq!(filter.conditions.len(), 1);
    /// assert_eq!(filter.conditions[0].path, vec!["title"]);
    /// assert_eq!(filter.conditions[0].value, "Hello!");
    ///
    /// // The root marker is mandatory.
    /// assert!(PathFilter::parse(r#"? (@.title == "Hello!")"#).is_err());
    /// ```
    pub fn parse(expression: &str) -> Result<Self> {
        trace!("Parsing filter expression: {}", expression);
        let filter = Parser::new(expression).parse()?;
        debug!(
            "Filter expression parsed into {} condition(s)",
            filter.conditions.len()
        );
        Ok(filter)
    }

    /// Appends this filter's conditions to a query as parameterized predicates.
    ///
    /// Each condition becomes ` AND json_value #>> $n = $m`, with the path
    /// bound as a `TEXT[]` parameter and the literal bound as `TEXT`. The
    /// database evaluates the predicate over the JSONB column directly;
    /// documents are never pulled into the application for filtering.
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for condition in &self.conditions {
            builder.push(" AND json_value #>> ");
            builder.push_bind(condition.path.clone());
            builder.push(" = ");
            builder.push_bind(condition.value.clone());
        }
    }
}

/// Hand-rolled scanner for the filter grammar.
struct Parser<'a> {
    expression: &'a str,
    chars:      std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.chars().peekable(),
        }
    }

    fn error(&self, reason: &str) -> VaultError {
        VaultError::InvalidFilterExpression {
            expression: self.expression.to_owned(),
            reason:     reason.to_owned(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|ch| ch.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, expected: char, reason: &str) -> Result<()> {
        if self.chars.next_if_eq(&expected).is_some() {
            Ok(())
        }
        else {
            Err(self.error(reason))
        }
    }

    fn parse(mut self) -> Result<PathFilter> {
        self.skip_whitespace();
        self.expect('$', "expression must start with the root marker '$'")?;
        self.skip_whitespace();
        self.expect('?', "expected '?' after the root marker")?;
        self.skip_whitespace();
        self.expect('(', "expected '(' opening the predicate")?;

        let mut conditions = vec![self.parse_condition()?];
        loop {
            self.skip_whitespace();
            if self.chars.next_if_eq(&')').is_some() {
                break;
            }
            self.expect('&', "expected '&&' or ')' after a condition")?;
            self.expect('&', "expected '&&' or ')' after a condition")?;
            conditions.push(self.parse_condition()?);
        }

        self.skip_whitespace();
        if self.chars.peek().is_some() {
            return Err(self.error("unexpected trailing characters after the predicate"));
        }

        Ok(PathFilter {
            conditions,
        })
    }

    fn parse_condition(&mut self) -> Result<PathCondition> {
        self.skip_whitespace();
        self.expect('@', "condition must start with '@'")?;
        self.expect('.', "expected '.' after '@'")?;

        let mut path = vec![self.parse_segment()?];
        while self.chars.next_if_eq(&'.').is_some() {
            path.push(self.parse_segment()?);
        }

        self.skip_whitespace();
        self.expect('=', "expected '==' after the field path")?;
        self.expect('=', "expected '==' after the field path")?;
        self.skip_whitespace();

        let value = self.parse_string_literal()?;
        Ok(PathCondition {
            path,
            value,
        })
    }

    fn parse_segment(&mut self) -> Result<String> {
        let mut segment = String::new();
        while let Some(ch) = self
            .chars
            .next_if(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        {
            segment.push(ch);
        }
        if segment.is_empty() {
            return Err(self.error("empty path segment"));
        }
        Ok(segment)
    }

    fn parse_string_literal(&mut self) -> Result<String> {
        self.expect('"', "comparison value must be a double-quoted string")?;
        let mut literal = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(literal),
                Some('\\') => {
                    // Backslash escapes the next character verbatim.
                    match self.chars.next() {
                        Some(escaped) => literal.push(escaped),
                        None => return Err(self.error("unterminated string literal")),
                    }
                },
                Some(ch) => literal.push(ch),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }
}
