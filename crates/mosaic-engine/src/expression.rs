//! Band math expressions.
//!
//! A small arithmetic language over band values, e.g.
//! `(B08-B04)/(B08+B04)`. A request may carry several comma-separated
//! expressions; each produces one derived output band named by its source
//! text. Parsing happens before any I/O so malformed input never costs a
//! network round trip.

use mosaic_common::{Band, MosaicError, MosaicResult};

/// A parsed expression together with its output band name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpression {
    /// Output band name: the trimmed source text.
    pub name: String,
    expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Band(Band),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl NamedExpression {
    /// Bands referenced by this expression, in first-appearance order.
    pub fn required_bands(&self) -> Vec<Band> {
        let mut bands = Vec::new();
        collect_bands(&self.expr, &mut bands);
        bands
    }

    /// Evaluate for one pixel, looking band values up through `value_of`.
    ///
    /// The caller masks non-finite results (e.g. division by zero) instead
    /// of treating them as data.
    pub fn evaluate(&self, value_of: &impl Fn(Band) -> f64) -> f64 {
        eval(&self.expr, value_of)
    }
}

fn collect_bands(expr: &Expr, out: &mut Vec<Band>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Band(b) => {
            if !out.contains(b) {
                out.push(*b);
            }
        }
        Expr::Neg(inner) => collect_bands(inner, out),
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
            collect_bands(l, out);
            collect_bands(r, out);
        }
    }
}

fn eval(expr: &Expr, value_of: &impl Fn(Band) -> f64) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Band(b) => value_of(*b),
        Expr::Neg(inner) => -eval(inner, value_of),
        Expr::Add(l, r) => eval(l, value_of) + eval(r, value_of),
        Expr::Sub(l, r) => eval(l, value_of) - eval(r, value_of),
        Expr::Mul(l, r) => eval(l, value_of) * eval(r, value_of),
        Expr::Div(l, r) => eval(l, value_of) / eval(r, value_of),
    }
}

/// Parse a comma-separated list of expressions.
pub fn parse_expressions(source: &str) -> MosaicResult<Vec<NamedExpression>> {
    let parts: Vec<&str> = split_top_level(source);
    if parts.iter().all(|p| p.trim().is_empty()) {
        return Err(MosaicError::expression("empty expression"));
    }

    parts
        .into_iter()
        .map(|part| {
            let name = part.trim().to_string();
            let mut parser = Parser::new(part);
            let expr = parser.parse_expr()?;
            parser.expect_end()?;
            Ok(NamedExpression { name, expr })
        })
        .collect()
}

/// Split on commas outside parentheses.
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in source.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> MosaicResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(MosaicError::expression(format!(
                "unexpected trailing input near {:?}",
                token
            ))),
        }
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> MosaicResult<Expr> {
        let mut lhs = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.parse_term()?));
                }
                Token::Minus => {
                    self.advance();
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> MosaicResult<Expr> {
        let mut lhs = self.parse_factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.parse_factor()?));
                }
                Token::Slash => {
                    self.advance();
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.parse_factor()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // factor := '-' factor | primary
    fn parse_factor(&mut self) -> MosaicResult<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.parse_factor()?)));
        }
        self.parse_primary()
    }

    // primary := number | band | '(' expr ')'
    fn parse_primary(&mut self) -> MosaicResult<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => {
                // An unknown band in an expression is an expression error,
                // never a silently dropped term.
                let band = Band::parse(&name)
                    .map_err(|_| MosaicError::expression(format!("unknown band '{}'", name)))?;
                Ok(Expr::Band(band))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(MosaicError::expression("missing closing parenthesis")),
                }
            }
            other => Err(MosaicError::expression(format!(
                "expected a value, found {:?}",
                other
            ))),
        }
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let number = source[start..i].parse().unwrap_or(f64::NAN);
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Ident(source[start..i].to_string()));
            }
            _ => {
                // Unknown characters become an ident token the parser will
                // reject with a useful message.
                tokens.push(Token::Ident(c.to_string()));
                i += 1;
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(Band, f64)]) -> impl Fn(Band) -> f64 + '_ {
        move |band| {
            pairs
                .iter()
                .find(|(b, _)| *b == band)
                .map(|(_, v)| *v)
                .unwrap_or(f64::NAN)
        }
    }

    #[test]
    fn test_parse_ndvi() {
        let exprs = parse_expressions("(B08-B04)/(B08+B04)").unwrap();
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].name, "(B08-B04)/(B08+B04)");
        assert_eq!(exprs[0].required_bands(), vec![Band::B08, Band::B04]);

        let v = exprs[0].evaluate(&values(&[(Band::B08, 6.0), (Band::B04, 2.0)]));
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_precedence_and_unary_minus() {
        let exprs = parse_expressions("B02+B03*2").unwrap();
        let v = exprs[0].evaluate(&values(&[(Band::B02, 1.0), (Band::B03, 3.0)]));
        assert_eq!(v, 7.0);

        let exprs = parse_expressions("-B02*3").unwrap();
        let v = exprs[0].evaluate(&values(&[(Band::B02, 2.0)]));
        assert_eq!(v, -6.0);
    }

    #[test]
    fn test_multiple_expressions() {
        let exprs = parse_expressions("B02/B03, B04-0.5").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].name, "B02/B03");
        assert_eq!(exprs[1].name, "B04-0.5");
    }

    #[test]
    fn test_short_form_bands_in_expression() {
        let exprs = parse_expressions("B8/B4").unwrap();
        assert_eq!(exprs[0].required_bands(), vec![Band::B08, Band::B04]);
    }

    #[test]
    fn test_unknown_band_is_rejected() {
        let err = parse_expressions("B8A+B02").unwrap_err();
        assert!(matches!(err, MosaicError::Expression(_)));
    }

    #[test]
    fn test_malformed_expressions_rejected() {
        for bad in ["", "B02+", "(B02", "B02)", "B02 B03", "*B02", "B02,,B03"] {
            assert!(
                matches!(parse_expressions(bad), Err(MosaicError::Expression(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn test_division_by_zero_is_not_finite() {
        let exprs = parse_expressions("B02/B03").unwrap();
        let v = exprs[0].evaluate(&values(&[(Band::B02, 1.0), (Band::B03, 0.0)]));
        assert!(!v.is_finite());
    }
}
