//! Parser for format strings.
//!
//! Outside `{ … }` blocks every character is literal text; `{{` and `}}`
//! escape literal braces, except when `{{` opens an expression block whose
//! expression is a map literal (`{{'key': 'value'}}`). Inside a block,
//! whitespace is insignificant and exactly one expression is expected.

use num_bigint::BigInt;

use templar_core::error::{ScriptError, ScriptResult};
use templar_core::functions;
use templar_core::value::Value;

use crate::ast::{CallKind, Expr, FunctionCall, SyntaxTree};
use crate::typecheck;

// Diagnostic categories for argument parsing. Kept as constants so tests and
// hosts can match on the exact message.
pub const NUMERICS_ONLY_ARGS: &str = "Numerics can only be used as arguments to functions";
pub const NUMERICS_INVALID_CHAR: &str = "Invalid character found in numeric argument";
pub const STRINGS_ONLY_ARGS: &str = "Strings can only be used as arguments to functions";
pub const UNEXPECTED_COMMA_ARGUMENT: &str = "Unexpected comma found in argument list";
pub const UNEXPECTED_CHAR_ARGUMENT: &str = "Unexpected character found in argument list";

/// Parse one format string into a syntax tree. Every built-in call in the
/// result has passed the static argument check.
pub fn parse(format_string: &str) -> ScriptResult<SyntaxTree> {
    Parser::new(format_string).parse_format()
}

/// Where an expression appears; bare numeric and string literals are only
/// legal in argument positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Argument,
}

struct Parser {
    source: Vec<char>,
    pos: usize,
    /// Set once a map literal's ':' has been consumed. A `{{` block attempt
    /// that fails before this point is re-read as an escaped brace; after it,
    /// the content is unambiguously an expression and errors propagate.
    map_commit: bool,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            map_commit: false,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ScriptError {
        ScriptError::InvalidSyntax {
            message: message.to_string(),
            pos: self.pos,
        }
    }

    fn parse_format(mut self) -> ScriptResult<SyntaxTree> {
        let mut tokens = Vec::new();
        let mut literal = String::new();

        fn flush(literal: &mut String, tokens: &mut Vec<Expr>) {
            if !literal.is_empty() {
                tokens.push(Expr::Literal(Value::string(std::mem::take(literal))));
            }
        }

        while let Some(ch) = self.current() {
            match ch {
                '{' if self.peek() == Some('{') => {
                    // Either a map-literal expression block or an escaped
                    // brace; try the block first and fall back to the escape
                    // when the content never takes map shape.
                    let checkpoint = self.pos;
                    self.map_commit = false;
                    match self.parse_expression_block() {
                        Ok(expr) => {
                            flush(&mut literal, &mut tokens);
                            tokens.push(expr);
                        }
                        Err(ScriptError::InvalidSyntax { .. }) if !self.map_commit => {
                            self.pos = checkpoint + 2;
                            literal.push('{');
                        }
                        Err(other) => return Err(other),
                    }
                }
                '{' => {
                    let expr = self.parse_expression_block()?;
                    flush(&mut literal, &mut tokens);
                    tokens.push(expr);
                }
                '}' if self.peek() == Some('}') => {
                    self.pos += 2;
                    literal.push('}');
                }
                '}' => return Err(self.error("unbalanced '}' outside an expression")),
                ch => {
                    literal.push(ch);
                    self.pos += 1;
                }
            }
        }
        flush(&mut literal, &mut tokens);
        Ok(SyntaxTree::new(tokens))
    }

    fn parse_expression_block(&mut self) -> ScriptResult<Expr> {
        self.advance(); // '{'
        self.skip_whitespace();
        if self.current() == Some('}') {
            return Err(self.error("empty expression block"));
        }
        let expr = self.parse_expression(Context::Block)?;
        self.skip_whitespace();
        match self.current() {
            Some('}') => {
                self.advance();
                Ok(expr)
            }
            Some(_) => Err(self.error(UNEXPECTED_CHAR_ARGUMENT)),
            None => Err(self.error("unbalanced '{' in format string")),
        }
    }

    fn parse_expression(&mut self, context: Context) -> ScriptResult<Expr> {
        match self.current() {
            None => Err(self.error("unexpected end of expression")),
            Some('%') => self.parse_function_or_lambda(),
            Some('$') => self.parse_function_arg(),
            Some('\'' | '"') => {
                if context == Context::Block {
                    Err(self.error(STRINGS_ONLY_ARGS))
                } else {
                    self.parse_string_literal()
                }
            }
            Some('[') => self.parse_array(),
            Some('{') => self.parse_map(),
            Some(ch) if ch.is_ascii_digit() || ch == '-' => {
                if context == Context::Block {
                    Err(self.error(NUMERICS_ONLY_ARGS))
                } else {
                    self.parse_numeric()
                }
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_identifier(),
            Some(',') => Err(self.error(UNEXPECTED_COMMA_ARGUMENT)),
            Some(_) => Err(self.error(UNEXPECTED_CHAR_ARGUMENT)),
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn parse_identifier(&mut self) -> ScriptResult<Expr> {
        let name = self.read_identifier();
        Ok(match name.as_str() {
            "True" => Expr::Literal(Value::Boolean(true)),
            "False" => Expr::Literal(Value::Boolean(false)),
            _ => Expr::Variable(name),
        })
    }

    fn parse_function_or_lambda(&mut self) -> ScriptResult<Expr> {
        self.advance(); // '%'
        let name = self.read_identifier();
        if name.is_empty() {
            return Err(self.error("expected a function name after '%'"));
        }
        if self.current() != Some('(') {
            // A bare %name is the function-as-value form.
            return Ok(Expr::Literal(Value::lambda(name)));
        }
        self.advance(); // '('
        let args = self.parse_arguments(')')?;
        let call = match functions::lookup(&name) {
            Some(spec) => {
                let call = FunctionCall {
                    name,
                    kind: CallKind::Builtin,
                    args,
                };
                typecheck::check_call(&call, &spec)?;
                call
            }
            None => FunctionCall {
                name,
                kind: CallKind::Custom,
                args,
            },
        };
        Ok(Expr::Call(call))
    }

    fn parse_arguments(&mut self, closer: char) -> ScriptResult<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.current() == Some(closer) {
            self.advance();
            return Ok(args);
        }
        loop {
            self.skip_whitespace();
            args.push(self.parse_expression(Context::Argument)?);
            self.skip_whitespace();
            match self.current() {
                Some(ch) if ch == closer => {
                    self.advance();
                    return Ok(args);
                }
                Some(',') => {
                    self.advance();
                }
                Some(_) => return Err(self.error(UNEXPECTED_CHAR_ARGUMENT)),
                None => return Err(self.error("unterminated argument list")),
            }
        }
    }

    fn parse_function_arg(&mut self) -> ScriptResult<Expr> {
        self.advance(); // '$'
        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        let index: usize = digits
            .parse()
            .map_err(|_| self.error("expected a digit after '$'"))?;
        Ok(Expr::FunctionArg(index))
    }

    fn parse_string_literal(&mut self) -> ScriptResult<Expr> {
        let Some(quote) = self.advance() else {
            return Err(self.error("unexpected end of expression"));
        };
        let mut out = String::new();
        loop {
            match self.advance() {
                Some(ch) if ch == quote => break,
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(Expr::Literal(Value::string(out)))
    }

    /// Numerics consume everything up to the next delimiter so that malformed
    /// tokens like `-1 -` or `0001b` surface as invalid-character errors
    /// rather than stray-character ones.
    fn parse_numeric(&mut self) -> ScriptResult<Expr> {
        let mut raw = String::new();
        while let Some(ch) = self.current() {
            if matches!(ch, ',' | ')' | ']' | '}' | ':') {
                break;
            }
            raw.push(ch);
            self.pos += 1;
        }
        let token = raw.trim_end();

        let digits = match token.strip_prefix('-') {
            Some(rest) => rest,
            None => token,
        };
        let mut seen_dot = false;
        let valid = !digits.is_empty()
            && !digits.starts_with('.')
            && !digits.ends_with('.')
            && digits.chars().all(|ch| {
                if ch == '.' && !seen_dot {
                    seen_dot = true;
                    true
                } else {
                    ch.is_ascii_digit()
                }
            });
        if !valid {
            return Err(self.error(NUMERICS_INVALID_CHAR));
        }

        let literal = if seen_dot {
            token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(NUMERICS_INVALID_CHAR))?
        } else {
            token
                .parse::<BigInt>()
                .map(Value::Integer)
                .map_err(|_| self.error(NUMERICS_INVALID_CHAR))?
        };
        Ok(Expr::Literal(literal))
    }

    fn parse_array(&mut self) -> ScriptResult<Expr> {
        self.advance(); // '['
        Ok(Expr::Array(self.parse_arguments(']')?))
    }

    fn parse_map(&mut self) -> ScriptResult<Expr> {
        self.advance(); // '{'
        let mut entries = Vec::new();
        self.skip_whitespace();
        if self.current() == Some('}') {
            self.advance();
            return Ok(Expr::Map(entries));
        }
        loop {
            self.skip_whitespace();
            let key = self.parse_expression(Context::Argument)?;
            self.skip_whitespace();
            match self.current() {
                Some(':') => {
                    self.advance();
                    self.map_commit = true;
                }
                Some(_) => return Err(self.error(UNEXPECTED_CHAR_ARGUMENT)),
                None => return Err(self.error("unterminated map literal")),
            }
            self.check_map_key(&key)?;
            self.skip_whitespace();
            let value = self.parse_expression(Context::Argument)?;
            entries.push((key, value));
            self.skip_whitespace();
            match self.current() {
                Some('}') => {
                    self.advance();
                    return Ok(Expr::Map(entries));
                }
                Some(',') => {
                    self.advance();
                }
                Some(_) => return Err(self.error(UNEXPECTED_CHAR_ARGUMENT)),
                None => return Err(self.error("unterminated map literal")),
            }
        }
    }

    /// Literal map keys must be hashable. Keys produced by variables or calls
    /// are checked when the map is built at evaluation.
    fn check_map_key(&self, key: &Expr) -> ScriptResult<()> {
        let hashable = match key {
            Expr::Literal(value) => templar_core::value::MapKey::from_value(value).is_some(),
            Expr::Array(_) | Expr::Map(_) => false,
            Expr::Variable(_) | Expr::FunctionArg(_) | Expr::Call(_) => true,
        };
        if hashable {
            Ok(())
        } else {
            Err(self.error("map keys must be an Integer, String, or Boolean"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_single(format_string: &str) -> Expr {
        let mut tree = parse(format_string).expect("parse failed");
        assert_eq!(tree.tokens.len(), 1, "expected a single token");
        tree.tokens.remove(0)
    }

    #[test]
    fn literal_text_round_trips() {
        let tree = parse("plain text").unwrap();
        assert_eq!(
            tree.tokens,
            vec![Expr::Literal(Value::string("plain text"))]
        );
    }

    #[test]
    fn escaped_braces_are_literal() {
        let tree = parse("{{ value }}").unwrap();
        assert_eq!(
            tree.tokens,
            vec![Expr::Literal(Value::string("{ value }"))]
        );
    }

    #[test]
    fn lone_closing_brace_is_unbalanced() {
        assert!(matches!(
            parse("oops }"),
            Err(ScriptError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn variable_reference() {
        assert_eq!(parse_single("{title}"), Expr::Variable("title".into()));
    }

    #[test]
    fn mixed_literal_and_expressions() {
        let tree = parse("a {b} c").unwrap();
        assert_eq!(
            tree.tokens,
            vec![
                Expr::Literal(Value::string("a ")),
                Expr::Variable("b".into()),
                Expr::Literal(Value::string(" c")),
            ]
        );
    }

    #[test]
    fn map_literal_uses_doubled_braces() {
        let expr = parse_single("{{'key': 'value'}}");
        assert_eq!(
            expr,
            Expr::Map(vec![(
                Expr::Literal(Value::string("key")),
                Expr::Literal(Value::string("value")),
            )])
        );
    }

    #[test]
    fn nested_function_calls_parse() {
        let expr = parse_single("{%upper(%lower(title))}");
        let Expr::Call(outer) = expr else {
            panic!("expected call")
        };
        assert_eq!(outer.name, "upper");
        assert_eq!(outer.kind, CallKind::Builtin);
        let Expr::Call(inner) = &outer.args[0] else {
            panic!("expected nested call")
        };
        assert_eq!(inner.name, "lower");
    }

    #[test]
    fn unregistered_calls_are_custom() {
        let expr = parse_single("{%my_func('a')}");
        let Expr::Call(call) = expr else {
            panic!("expected call")
        };
        assert_eq!(call.kind, CallKind::Custom);
    }

    #[test]
    fn bare_lambda_reference() {
        let expr = parse_single("{%map_apply(m, %f)}");
        let Expr::Call(call) = expr else {
            panic!("expected call")
        };
        assert_eq!(call.args[1], Expr::Literal(Value::lambda("f")));
    }

    #[test]
    fn numerics_only_as_arguments() {
        for format_string in ["{1}", "{  1  }", "{-1}", "{   -1   }", "{0001}", "{  0001   }"] {
            match parse(format_string) {
                Err(ScriptError::InvalidSyntax { message, .. }) => {
                    assert_eq!(message, NUMERICS_ONLY_ARGS, "for {format_string:?}");
                }
                other => panic!("expected syntax error for {format_string:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_numerics_are_invalid_chars() {
        for format_string in [
            "{%add(0, --1)}",
            "{%add(0,  1-  )}",
            "{%add(0,-1-)}",
            "{%add(0,   -1 -   )}",
            "{%add(0,0001a)}",
            "{%add(0,  0001b   )}",
        ] {
            match parse(format_string) {
                Err(ScriptError::InvalidSyntax { message, .. }) => {
                    assert_eq!(message, NUMERICS_INVALID_CHAR, "for {format_string:?}");
                }
                other => panic!("expected syntax error for {format_string:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn valid_numerics_parse_in_argument_position() {
        let expr = parse_single("{%int(  0001   )}");
        let Expr::Call(call) = expr else {
            panic!("expected call")
        };
        assert_eq!(call.args[0], Expr::Literal(Value::from(1)));

        let expr = parse_single("{%float(-1.5)}");
        let Expr::Call(call) = expr else {
            panic!("expected call")
        };
        assert_eq!(call.args[0], Expr::Literal(Value::Float(-1.5)));
    }

    #[test]
    fn strings_only_as_arguments() {
        match parse("{'hello'}") {
            Err(ScriptError::InvalidSyntax { message, .. }) => {
                assert_eq!(message, STRINGS_ONLY_ARGS);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn leading_comma_is_an_unexpected_comma() {
        match parse("{%concat(, 'a')}") {
            Err(ScriptError::InvalidSyntax { message, .. }) => {
                assert_eq!(message, UNEXPECTED_COMMA_ARGUMENT);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn stray_characters_are_unexpected_chars() {
        match parse("{%concat('a' 'b')}") {
            Err(ScriptError::InvalidSyntax { message, .. }) => {
                assert_eq!(message, UNEXPECTED_CHAR_ARGUMENT);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn boolean_literals() {
        let expr = parse_single("{%if(True, 'a', 'b')}");
        let Expr::Call(call) = expr else {
            panic!("expected call")
        };
        assert_eq!(call.args[0], Expr::Literal(Value::Boolean(true)));
    }

    #[test]
    fn array_literals_allow_nested_expressions() {
        let expr = parse_single("{[%upper($0), %lower($1)]}");
        let Expr::Array(items) = expr else {
            panic!("expected array")
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_map_and_array_literals() {
        assert_eq!(parse_single("{[]}"), Expr::Array(vec![]));
        assert_eq!(parse_single("{{}}"), Expr::Map(vec![]));
    }

    #[test]
    fn non_hashable_literal_map_keys_are_rejected() {
        assert!(matches!(
            parse("{{1.5: 'a'}}"),
            Err(ScriptError::InvalidSyntax { .. })
        ));
        assert!(matches!(
            parse("{{['a']: 'b'}}"),
            Err(ScriptError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn unbalanced_block_is_a_syntax_error() {
        assert!(matches!(
            parse("{%upper(title)"),
            Err(ScriptError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn type_errors_inside_map_blocks_propagate() {
        // The {{ fallback must not swallow a failed argument check.
        assert!(matches!(
            parse("{{'k': %array_extend('a', 'b')}}"),
            Err(ScriptError::IncompatibleFunctionArguments { .. })
        ));
    }
}
