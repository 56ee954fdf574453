use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use super::{AnnotationTier, Interval, Point};

/// A parsed TextGrid in either Praat text layout (long or short).
#[derive(Debug, Clone, PartialEq)]
pub struct TextGrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<AnnotationTier>,
}

impl TextGrid {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("failed to read TextGrid {:?}", path))?;
        let text = decode(&bytes).with_context(|| format!("failed to decode TextGrid {:?}", path))?;
        Self::parse(&text).with_context(|| format!("failed to parse TextGrid {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = Tokens::new(tokenize(text)?);
        let file_type = tokens.string()?;
        if file_type != "ooTextFile" {
            bail!("unexpected file type {:?}", file_type);
        }
        let class = tokens.string()?;
        if class != "TextGrid" {
            bail!("unexpected object class {:?}", class);
        }
        let xmin = tokens.number()?;
        let xmax = tokens.number()?;
        if !tokens.flag()? {
            return Ok(Self {
                xmin,
                xmax,
                tiers: Vec::new(),
            });
        }
        let size = tokens.count()?;
        let tiers = (0..size)
            .map(|idx| parse_tier(&mut tokens).with_context(|| format!("in tier {}", idx + 1)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { xmin, xmax, tiers })
    }

    pub fn tier(&self, index: usize) -> Option<&AnnotationTier> {
        self.tiers.get(index)
    }
}

fn parse_tier(tokens: &mut Tokens) -> Result<AnnotationTier> {
    let class = tokens.string()?;
    let name = tokens.string()?;
    let _xmin = tokens.number()?;
    let _xmax = tokens.number()?;
    let size = tokens.count()?;
    match class.as_str() {
        "IntervalTier" => {
            let intervals = (0..size)
                .map(|_| {
                    Ok(Interval {
                        start: tokens.number()?,
                        end: tokens.number()?,
                        text: tokens.string()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AnnotationTier::Interval { name, intervals })
        }
        "TextTier" => {
            let points = (0..size)
                .map(|_| {
                    Ok(Point {
                        time: tokens.number()?,
                        mark: tokens.string()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AnnotationTier::Point { name, points })
        }
        other => bail!("unsupported tier class {:?}", other),
    }
}

fn decode(bytes: &[u8]) -> Result<String> {
    let utf16 = |bytes: &[u8], from: fn([u8; 2]) -> u16| -> Result<String> {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| from([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|err| anyhow!(err))
    };
    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(std::str::from_utf8(rest)?.to_string()),
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Number(f64),
    Flag(bool),
}

/// Keeps the values of a Praat text file: quoted strings, numbers, and
/// `<exists>`/`<absent>` flags. Labels, `[..]` indices and `!` comments are dropped.
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            value.push('"');
                        }
                        Some('"') => break,
                        Some(ch) => value.push(ch),
                        None => bail!("unterminated string"),
                    }
                }
                tokens.push(Token::Text(value));
            }
            '!' => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            '[' => {
                for ch in chars.by_ref() {
                    if ch == ']' {
                        break;
                    }
                }
            }
            '<' => {
                let flag: String = chars.by_ref().take_while(|&ch| ch != '>').collect();
                match flag.as_str() {
                    "<exists" => tokens.push(Token::Flag(true)),
                    "<absent" => tokens.push(Token::Flag(false)),
                    other => bail!("unknown flag {:?}>", other),
                }
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut literal = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E') {
                        literal.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .with_context(|| format!("invalid number {:?}", literal))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                while chars
                    .peek()
                    .is_some_and(|ch| ch.is_alphanumeric() || *ch == '_')
                {
                    chars.next();
                }
            }
            _ => {
                chars.next();
            }
        }
    }
    Ok(tokens)
}

struct Tokens {
    inner: std::vec::IntoIter<Token>,
}

impl Tokens {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            inner: tokens.into_iter(),
        }
    }

    fn next(&mut self) -> Result<Token> {
        self.inner.next().ok_or_else(|| anyhow!("unexpected end of file"))
    }

    fn string(&mut self) -> Result<String> {
        match self.next()? {
            Token::Text(value) => Ok(value),
            other => bail!("expected a string, found {:?}", other),
        }
    }

    fn number(&mut self) -> Result<f64> {
        match self.next()? {
            Token::Number(value) => Ok(value),
            other => bail!("expected a number, found {:?}", other),
        }
    }

    fn count(&mut self) -> Result<usize> {
        let value = self.number()?;
        if value < 0.0 || value.fract() != 0.0 {
            bail!("invalid element count {}", value);
        }
        Ok(value as usize)
    }

    fn flag(&mut self) -> Result<bool> {
        match self.next()? {
            Token::Flag(value) => Ok(value),
            other => bail!("expected <exists> or <absent>, found {:?}", other),
        }
    }
}
