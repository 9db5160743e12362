//! Unit grammar.
//!
//! ```text
//! unit    := product [ shift origin ]
//! shift   := '@' | 'after' | 'from' | 'since'
//! origin  := number | timestamp
//! product := power ( ['*' | '.' | '/' | 'per'] power )*
//! power   := basic [ ('^' | '**') int | int ]      (bare int only when adjacent)
//! basic   := number | name | '(' product ')' | ('lg'|'ln'|'lb') '(' 're' product ')'
//! ```

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, UnitsError};
use crate::unit::Unit;

/// Resolves unit names (with prefixes and plurals) to units.
pub trait NameLookup {
    fn lookup(&self, name: &str) -> Option<Unit>;
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number { value: f64, integer: bool },
    Name(String),
    Mul,
    Div,
    Pow,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// No whitespace between this token and the previous one.
    adjacent: bool,
}

/// Parse a unit string against a name lookup.
pub fn parse_unit(input: &str, names: &dyn NameLookup) -> Result<Unit> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Unit::one());
    }

    let (expr, origin) = split_origin(trimmed);
    let unit = {
        let tokens = tokenize(expr).map_err(|reason| UnitsError::parse(input, reason))?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            names,
        };
        let unit = parser
            .parse_product()
            .map_err(|reason| UnitsError::parse(input, reason))?;
        if parser.pos != parser.tokens.len() {
            return Err(UnitsError::parse(input, "unexpected trailing input"));
        }
        unit
    };

    match origin {
        None => Ok(unit),
        Some(origin) => apply_origin(&unit, origin).map_err(|reason| UnitsError::parse(input, reason)),
    }
}

fn apply_origin(unit: &Unit, origin: &str) -> std::result::Result<Unit, String> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err("missing origin after shift operator".to_string());
    }
    if let Ok(value) = origin.parse::<f64>() {
        return unit.shifted(value);
    }
    let epoch = parse_timestamp(origin)?;
    unit.since_epoch(epoch)
}

/// Split `expr <shift> origin` at the first top-level shift operator.
fn split_origin(input: &str) -> (&str, Option<&str>) {
    let mut depth = 0i32;
    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '@' if depth == 0 => return (&input[..idx], Some(&input[idx + 1..])),
            c if depth == 0 && c.is_whitespace() => {
                let rest = input[idx..].trim_start();
                for word in ["since", "after", "from"] {
                    let keyword = rest.get(..word.len()).is_some_and(|w| w.eq_ignore_ascii_case(word));
                    if keyword && rest.as_bytes().get(word.len()).is_some_and(|b| b.is_ascii_whitespace()) {
                        return (&input[..idx], Some(&rest[word.len()..]));
                    }
                }
            }
            _ => {}
        }
    }
    (input, None)
}

/// Parse a timestamp origin into seconds since 1970-01-01T00:00:00Z.
pub fn parse_timestamp(text: &str) -> std::result::Result<f64, String> {
    let mut body = text.trim().to_string();
    let mut zone_seconds = 0i64;

    for suffix in ["UTC", "GMT", "Z"] {
        if body.ends_with(suffix) {
            body.truncate(body.len() - suffix.len());
            body = body.trim_end().to_string();
            break;
        }
    }

    // trailing numeric zone: "+01:00", "-6:00", "+0100"
    if let Some(pos) = body
        .rfind(|c: char| c == ' ' || c == '+')
        .filter(|p| *p > 10)
    {
        let candidate = body[pos..].trim();
        if let Some(offset) = parse_zone(candidate) {
            zone_seconds = offset;
            body.truncate(pos);
            body = body.trim_end().to_string();
        }
    }

    let naive = parse_naive(&body).ok_or_else(|| format!("invalid timestamp '{}'", text))?;
    let utc = Utc.from_utc_datetime(&naive);
    Ok(utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9 - zone_seconds as f64)
}

fn parse_zone(text: &str) -> Option<i64> {
    let sign = match text.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits = text.get(1..)?;
    if !digits.is_ascii() {
        return None;
    }
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?),
        None if digits.len() == 4 => (digits.get(..2)?.parse().ok()?, digits.get(2..)?.parse().ok()?),
        None if digits.len() <= 2 => (digits.parse().ok()?, 0),
        None => return None,
    };
    Some(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '°' | '%' | '\'' | '"')
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut adjacent = false;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            adjacent = false;
            i += 1;
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && next.is_some_and(|n| n.is_ascii_digit()) && !follows_operand(&tokens, adjacent))
            || ((c == '-' || c == '+') && next.is_some_and(|n| n.is_ascii_digit() || n == '.'));

        let kind = if starts_number {
            let start = i;
            let mut integer = true;
            if c == '-' || c == '+' {
                i += 1;
            }
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
                integer = false;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '-' || chars[j] == '+') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    integer = false;
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{}'", text))?;
            TokenKind::Number { value, integer }
        } else if is_name_char(c) {
            let start = i;
            while i < chars.len() && is_name_char(chars[i]) {
                i += 1;
            }
            TokenKind::Name(chars[start..i].iter().collect())
        } else {
            i += 1;
            match c {
                '*' if next == Some('*') => {
                    i += 1;
                    TokenKind::Pow
                }
                '*' | '.' | '·' => TokenKind::Mul,
                '/' => TokenKind::Div,
                '^' => TokenKind::Pow,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                other => return Err(format!("unexpected character '{}'", other)),
            }
        };

        tokens.push(Token { kind, adjacent });
        adjacent = true;
    }

    Ok(tokens)
}

fn follows_operand(tokens: &[Token], adjacent: bool) -> bool {
    adjacent
        && matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Name(_)) | Some(TokenKind::RParen) | Some(TokenKind::Number { .. })
        )
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    names: &'a dyn NameLookup,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_product(&mut self) -> std::result::Result<Unit, String> {
        let mut acc = self.parse_power()?;
        loop {
            let Some(kind) = self.peek().map(|t| t.kind.clone()) else {
                break;
            };
            match kind {
                TokenKind::Mul => {
                    self.next();
                    let rhs = self.parse_power()?;
                    acc = acc.multiply(&rhs)?;
                }
                TokenKind::Div => {
                    self.next();
                    let rhs = self.parse_power()?;
                    acc = acc.divide(&rhs)?;
                }
                TokenKind::Name(name) if name.eq_ignore_ascii_case("per") => {
                    self.next();
                    let rhs = self.parse_power()?;
                    acc = acc.divide(&rhs)?;
                }
                TokenKind::Number { .. } | TokenKind::Name(_) | TokenKind::LParen => {
                    let rhs = self.parse_power()?;
                    acc = acc.multiply(&rhs)?;
                }
                TokenKind::RParen => break,
                TokenKind::Pow => return Err("unexpected exponent operator".to_string()),
            }
        }
        Ok(acc)
    }

    fn parse_power(&mut self) -> std::result::Result<Unit, String> {
        let (base, takes_bare_exponent) = self.parse_basic()?;
        match self.peek().map(|t| (t.kind.clone(), t.adjacent)) {
            Some((TokenKind::Pow, _)) => {
                self.next();
                let exponent = self.parse_exponent()?;
                base.pow(exponent)
            }
            Some((TokenKind::Number { value, integer: true }, true)) if takes_bare_exponent => {
                self.next();
                base.pow(value as i32)
            }
            _ => Ok(base),
        }
    }

    fn parse_exponent(&mut self) -> std::result::Result<i32, String> {
        match self.next().map(|t| t.kind) {
            Some(TokenKind::Number { value, integer: true }) => Ok(value as i32),
            Some(TokenKind::LParen) => {
                let exponent = self.parse_exponent()?;
                match self.next().map(|t| t.kind) {
                    Some(TokenKind::RParen) => Ok(exponent),
                    _ => Err("expected ')' after exponent".to_string()),
                }
            }
            _ => Err("exponent must be an integer".to_string()),
        }
    }

    fn parse_basic(&mut self) -> std::result::Result<(Unit, bool), String> {
        match self.next().map(|t| t.kind) {
            Some(TokenKind::Number { value, .. }) => Ok((Unit::number(value), false)),
            Some(TokenKind::LParen) => {
                let inner = self.parse_product()?;
                match self.next().map(|t| t.kind) {
                    Some(TokenKind::RParen) => Ok((inner, true)),
                    _ => Err("unbalanced parentheses".to_string()),
                }
            }
            Some(TokenKind::Name(name)) => {
                if let Some(radix) = log_radix(&name) {
                    if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                        return self.parse_logarithm(radix).map(|u| (u, false));
                    }
                }
                self.names
                    .lookup(&name)
                    .map(|u| (u, true))
                    .ok_or_else(|| format!("unknown unit '{}'", name))
            }
            Some(other) => Err(format!("unexpected token {:?}", other)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn parse_logarithm(&mut self, radix: f64) -> std::result::Result<Unit, String> {
        self.next(); // '('
        match self.next().map(|t| t.kind) {
            Some(TokenKind::Name(re)) if re == "re" => {}
            _ => return Err("logarithmic unit needs 're <reference>'".to_string()),
        }
        let reference = self.parse_product()?;
        match self.next().map(|t| t.kind) {
            Some(TokenKind::RParen) => Unit::logarithmic(radix, &reference),
            _ => Err("unbalanced parentheses in logarithmic unit".to_string()),
        }
    }
}

fn log_radix(name: &str) -> Option<f64> {
    match name {
        "lg" | "log" => Some(10.0),
        "ln" => Some(std::f64::consts::E),
        "lb" => Some(2.0),
        _ => None,
    }
}
