//! Effect script compiler
//!
//! Parses effect expressions into a small syntax tree and derives the effect
//! timeline from it. The compiler checks structure only: names and argument
//! lists are not matched against a catalogue of known effects.

use serde::{Deserialize, Serialize};

use super::lexer::{tokenize, Token, TokenKind};
use super::EffectError;

/// Deepest nesting of groups, tuples, arrays and references a script may use
const MAX_NESTING: usize = 128;

/// Parsed effect expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(u64),
    Float(f64),
    Str(String),
    Bool(bool),
    Path(Vec<String>),
    Call {
        path: Vec<String>,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Tuple(Vec<Expr>),
    Array(Vec<Expr>),
    Ref(Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    /// Path of the call if this is an `fx::` effect constructor
    fn effect_path(&self) -> Option<&[String]> {
        match self {
            Expr::Call { path, .. } if path.len() >= 2 && path[0] == "fx" => Some(path.as_slice()),
            Expr::MethodCall { receiver, .. } => receiver.effect_path(),
            _ => None,
        }
    }
}

/// Total running time of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ms")]
pub enum Timeline {
    Finite(u32),
    Infinite,
}

impl Timeline {
    fn max(self, other: Timeline) -> Timeline {
        match (self, other) {
            (Timeline::Finite(a), Timeline::Finite(b)) => Timeline::Finite(a.max(b)),
            _ => Timeline::Infinite,
        }
    }

    fn plus(self, other: Timeline) -> Timeline {
        match (self, other) {
            (Timeline::Finite(a), Timeline::Finite(b)) => Timeline::Finite(a.saturating_add(b)),
            _ => Timeline::Infinite,
        }
    }

    /// Duration in milliseconds, `None` for effects that never finish
    pub fn millis(&self) -> Option<u32> {
        match self {
            Timeline::Finite(ms) => Some(*ms),
            Timeline::Infinite => None,
        }
    }
}

/// Result of compiling an effect script
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEffect {
    /// Root constructor, e.g. `fx::slide_in`
    pub name: String,
    pub timeline: Timeline,
    pub expr: Expr,
}

/// Compiles effect scripts for the headless engine
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectCompiler;

impl EffectCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a script into an effect description
    pub fn compile(&self, source: &str) -> Result<CompiledEffect, EffectError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(EffectError::new("empty effect script", 0));
        }

        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: source.len(),
            depth: 0,
        };
        let expr = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(EffectError::new(
                format!("unexpected {} after effect", token.kind.describe()),
                token.offset,
            ));
        }

        let path = expr
            .effect_path()
            .ok_or_else(|| EffectError::new("script must be an fx:: effect", tokens[0].offset))?;
        let name = path.join("::");
        let timeline = timeline_of(&expr);

        Ok(CompiledEffect {
            name,
            timeline,
            expr,
        })
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), EffectError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(EffectError::new(
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
                token.offset,
            )),
            None => Err(EffectError::new(
                format!("expected {}, found end of script", kind.describe()),
                self.end,
            )),
        }
    }

    fn ident(&mut self) -> Result<String, EffectError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name.clone()),
            Some(token) => Err(EffectError::new(
                format!("expected identifier, found {}", token.kind.describe()),
                offset,
            )),
            None => Err(EffectError::new("expected identifier", offset)),
        }
    }

    fn expr(&mut self) -> Result<Expr, EffectError> {
        let mut expr = self.unary()?;

        while self.peek_kind() == Some(&TokenKind::Dot) {
            self.pos += 1;
            let method = self.ident()?;
            self.expect(TokenKind::LParen)?;
            let args = self.list(TokenKind::RParen)?;
            expr = Expr::MethodCall {
                receiver: Box::new(expr),
                method,
                args,
            };
        }

        Ok(expr)
    }

    /// Every recursive path through the grammar passes through here
    fn unary(&mut self) -> Result<Expr, EffectError> {
        if self.depth >= MAX_NESTING {
            return Err(EffectError::new("effect nested too deeply", self.offset()));
        }
        self.depth += 1;
        let expr = self.unary_inner();
        self.depth -= 1;
        expr
    }

    fn unary_inner(&mut self) -> Result<Expr, EffectError> {
        match self.peek_kind() {
            Some(TokenKind::Amp) => {
                self.pos += 1;
                Ok(Expr::Ref(Box::new(self.unary()?)))
            }
            Some(TokenKind::Minus) => {
                self.pos += 1;
                let offset = self.offset();
                match self.primary()? {
                    number @ (Expr::Int(_) | Expr::Float(_)) => Ok(Expr::Neg(Box::new(number))),
                    _ => Err(EffectError::new("'-' must precede a number", offset)),
                }
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, EffectError> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(EffectError::new("unexpected end of script", offset));
        };

        match token.kind.clone() {
            TokenKind::Int(v) => Ok(Expr::Int(v)),
            TokenKind::Float(v) => Ok(Expr::Float(v)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Ident(name) if name == "true" => Ok(Expr::Bool(true)),
            TokenKind::Ident(name) if name == "false" => Ok(Expr::Bool(false)),
            TokenKind::Ident(name) => {
                let mut path = vec![name];
                while self.peek_kind() == Some(&TokenKind::PathSep) {
                    self.pos += 1;
                    path.push(self.ident()?);
                }
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    let args = self.list(TokenKind::RParen)?;
                    Ok(Expr::Call { path, args })
                } else {
                    Ok(Expr::Path(path))
                }
            }
            TokenKind::LParen => {
                let mut items = self.list(TokenKind::RParen)?;
                // `(x)` is grouping, `(x,)` and `(x, y)` are tuples
                let trailing_comma = matches!(
                    self.tokens.get(self.pos.saturating_sub(2)),
                    Some(Token {
                        kind: TokenKind::Comma,
                        ..
                    })
                );
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Expr::Tuple(items))
                }
            }
            TokenKind::LBracket => Ok(Expr::Array(self.list(TokenKind::RBracket)?)),
            other => Err(EffectError::new(
                format!("unexpected {}", other.describe()),
                offset,
            )),
        }
    }

    /// Comma separated expressions up to `close`, trailing comma allowed
    fn list(&mut self, close: TokenKind) -> Result<Vec<Expr>, EffectError> {
        let mut items = Vec::new();
        loop {
            if self.peek_kind() == Some(&close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.expr()?);
            match self.peek_kind() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(kind) if *kind == close => {}
                _ => {
                    let found = self
                        .peek()
                        .map_or("end of script".to_string(), |t| t.kind.describe());
                    return Err(EffectError::new(
                        format!("expected ',' or {}, found {}", close.describe(), found),
                        self.offset(),
                    ));
                }
            }
        }
    }
}

/// Derive the running time of an effect expression
fn timeline_of(expr: &Expr) -> Timeline {
    let (path, args) = match expr {
        Expr::MethodCall { receiver, .. } => return timeline_of(receiver),
        Expr::Call { path, args } => (path, args),
        _ => return Timeline::Finite(0),
    };

    let children: Vec<Timeline> = nested_effects(args).map(timeline_of).collect();
    let name = path.last().map(String::as_str).unwrap_or_default();

    match name {
        "parallel" => children
            .into_iter()
            .fold(Timeline::Finite(0), Timeline::max),
        "sequence" => children
            .into_iter()
            .fold(Timeline::Finite(0), Timeline::plus),
        "repeating" | "never_complete" => Timeline::Infinite,
        "ping_pong" => {
            // Plays forward, then back
            let forward = children
                .into_iter()
                .fold(Timeline::Finite(0), Timeline::max);
            forward.plus(forward)
        }
        "sleep" | "delay" => {
            let own = args
                .iter()
                .enumerate()
                .find_map(|(i, arg)| timer_millis(arg, i + 1 == args.len()))
                .unwrap_or(0);
            children
                .into_iter()
                .fold(Timeline::Finite(own), Timeline::plus)
        }
        _ => {
            // A bare integer only counts as the timer in last position
            let own = args
                .iter()
                .enumerate()
                .find_map(|(i, arg)| tuple_timer_millis(arg, i + 1 == args.len()))
                .or_else(|| match args.last() {
                    Some(Expr::Int(ms)) => Some(clamp_millis(*ms)),
                    _ => None,
                })
                .unwrap_or(0);
            children
                .into_iter()
                .fold(Timeline::Finite(own), Timeline::max)
        }
    }
}

/// Effect constructors among call arguments, looking through `&[...]`
fn nested_effects(args: &[Expr]) -> impl Iterator<Item = &Expr> {
    let mut found = Vec::new();
    let mut stack: Vec<&Expr> = args.iter().rev().collect();
    while let Some(expr) = stack.pop() {
        match expr {
            Expr::Ref(inner) => stack.push(inner),
            Expr::Array(items) => stack.extend(items.iter().rev()),
            other if other.effect_path().is_some() => found.push(other),
            _ => {}
        }
    }
    found.into_iter()
}

/// `(ms, Interpolation::X)` tuples or `EffectTimer::from_ms(ms, ...)` calls.
///
/// A tuple without an interpolation only counts when it is the last argument.
fn tuple_timer_millis(expr: &Expr, last: bool) -> Option<u32> {
    match expr {
        Expr::Tuple(items) => match items.as_slice() {
            [Expr::Int(ms), Expr::Path(path)] if is_interpolation(path) => Some(clamp_millis(*ms)),
            [Expr::Int(ms), ..] if last => Some(clamp_millis(*ms)),
            _ => None,
        },
        Expr::Call { path, args } if path.last().is_some_and(|p| p == "from_ms") => {
            match args.first() {
                Some(Expr::Int(ms)) => Some(clamp_millis(*ms)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Like [`tuple_timer_millis`], but a bare integer also counts as a timer
fn timer_millis(expr: &Expr, last: bool) -> Option<u32> {
    match expr {
        Expr::Int(ms) => Some(clamp_millis(*ms)),
        other => tuple_timer_millis(other, last),
    }
}

fn is_interpolation(path: &[String]) -> bool {
    path.len() == 2 && path[0] == "Interpolation"
}

fn clamp_millis(ms: u64) -> u32 {
    ms.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Result<CompiledEffect, EffectError> {
        EffectCompiler::new().compile(source)
    }

    #[test]
    fn test_fade_effect() {
        let effect = compile("fx::fade_from_fg(Color::Black, (600, Interpolation::CubicOut))").unwrap();
        assert_eq!(effect.name, "fx::fade_from_fg");
        assert_eq!(effect.timeline, Timeline::Finite(600));
    }

    #[test]
    fn test_gradient_params_are_not_timers() {
        let effect = compile(
            "fx::slide_in(Motion::RightToLeft, 10, 0, Color::Black, (800, Interpolation::QuadOut))",
        )
        .unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(800));
    }

    #[test]
    fn test_trailing_integer_is_timer() {
        assert_eq!(compile("fx::coalesce(500)").unwrap().timeline, Timeline::Finite(500));
        assert_eq!(
            compile("fx::hsl_shift(Some([120.0, 25.0, 25.0]), None, 300)")
                .unwrap()
                .timeline,
            Timeline::Finite(300)
        );
    }

    #[test]
    fn test_parallel_takes_longest_child() {
        let effect = compile(
            r#"
            fx::parallel(&[
                fx::sweep_in(Motion::RightToLeft, 15, 0, Color::Black, (1000, Interpolation::BounceOut)),
                fx::coalesce((1500, Interpolation::QuadOut)),
            ])
            "#,
        )
        .unwrap();
        assert_eq!(effect.name, "fx::parallel");
        assert_eq!(effect.timeline, Timeline::Finite(1500));
    }

    #[test]
    fn test_sequence_sums_children() {
        let effect = compile(
            "fx::sequence(&[fx::sleep(200), fx::dissolve((300, Interpolation::Linear))])",
        )
        .unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(500));
    }

    #[test]
    fn test_ping_pong_and_repeating() {
        let ping = compile("fx::ping_pong(fx::coalesce((250, Interpolation::Linear)))").unwrap();
        assert_eq!(ping.timeline, Timeline::Finite(500));

        let forever = compile("fx::repeating(fx::coalesce(100))").unwrap();
        assert_eq!(forever.timeline, Timeline::Infinite);
        assert_eq!(forever.timeline.millis(), None);
    }

    #[test]
    fn test_method_chain_keeps_root_name() {
        let effect = compile("fx::dissolve((400, Interpolation::Linear)).with_area(Rect::new(0, 0, 10, 2))")
            .unwrap();
        assert_eq!(effect.name, "fx::dissolve");
        assert_eq!(effect.timeline, Timeline::Finite(400));
    }

    #[test]
    fn test_effect_timer_call() {
        let effect = compile("fx::fade_to_fg(Color::Red, EffectTimer::from_ms(750, Interpolation::Linear))")
            .unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(750));
    }

    #[test]
    fn test_malformed_scripts() {
        assert!(compile("").is_err());
        assert!(compile("   // nothing\n").is_err());
        assert!(compile("fx::fade_from_fg(Color::Black, (600, Interpolation::CubicOut)").is_err());
        assert!(compile("fx::fade_from_fg(Color::Black,, 600)").is_err());
        assert!(compile("fx::coalesce(500) fx::coalesce(500)").is_err());
        assert!(compile("this is not valid").is_err());
    }

    #[test]
    fn test_non_effect_root_rejected() {
        let err = compile("Color::Black").unwrap_err();
        assert!(err.message.contains("fx::"));
        assert!(compile("(600, Interpolation::Linear)").is_err());
    }

    #[test]
    fn test_error_offset_points_at_problem() {
        let source = "fx::coalesce(500))";
        let err = compile(source).unwrap_err();
        assert_eq!(err.offset, source.len() - 1);
    }

    #[test]
    fn test_offset_tuple_is_not_timer() {
        let effect = compile(
            "fx::translate(fx::dissolve(100), (5, 0), (400, Interpolation::Linear))",
        )
        .unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(400));

        // Without an interpolation, only a trailing tuple is a timer
        let effect = compile("fx::translate(fx::dissolve(100), (5, 0))").unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(100));
        let effect = compile("fx::dissolve((250, 0))").unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(250));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("fx::coalesce({}1{})", "(".repeat(5_000), ")".repeat(5_000));
        let err = compile(&source).unwrap_err();
        assert!(err.message.contains("nested too deeply"));
        assert!(err.offset < source.len());

        let refs = format!("fx::parallel({}[])", "&".repeat(100_000));
        assert!(compile(&refs).is_err());

        let arrays = format!("fx::parallel({}{})", "[".repeat(100_000), "]".repeat(100_000));
        assert!(compile(&arrays).is_err());
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let source = format!(
            "fx::coalesce(({}500{}, Interpolation::Linear))",
            "(".repeat(100),
            ")".repeat(100)
        );
        assert_eq!(compile(&source).unwrap().timeline, Timeline::Finite(500));
    }

    #[test]
    fn test_negative_numbers_and_grouping() {
        let effect = compile("fx::translate(fx::coalesce(100), (-3, 0), ((200), Interpolation::Linear))")
            .unwrap();
        assert_eq!(effect.timeline, Timeline::Finite(200));
    }
}
