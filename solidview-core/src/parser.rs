/// Free-text shape descriptions ("a cylinder 4 units high with radius 2").
///
/// Parsing is best effort: every dimension falls back from a labeled
/// number, to the next unclaimed bare number, to a per-kind default. Only
/// text with neither a recognizable kind nor any number fails.
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::pair,
    IResult,
};
use thiserror::Error;
use tracing::debug;

use crate::shape::{ShapeDescriptor, ShapeKind};

/// Free text that could not be turned into a shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}. {hint}")]
pub struct ParseFailure {
    pub reason: String,
    pub hint: &'static str,
}

impl ParseFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            hint: "Try something like \"cylinder with radius 2 and height 4\" \
                   or \"rectangular prism 3 by 2 by 5\"",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Number(f64),
}

fn number(input: &str) -> IResult<&str, Token<'_>> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse::<f64>().map(Token::Number),
    )(input)
}

fn word(input: &str) -> IResult<&str, Token<'_>> {
    map(take_while1(char::is_alphabetic), Token::Word)(input)
}

/// `×` and `*` read as the word "x" so "3×2" and "3x2" tokenize alike
fn times(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Word("x"), one_of("×*"))(input)
}

fn separator(input: &str) -> IResult<&str, ()> {
    value(
        (),
        take_while1(|c: char| !(c.is_alphabetic() || c.is_ascii_digit() || c == '×' || c == '*')),
    )(input)
}

fn token(input: &str) -> IResult<&str, Option<Token<'_>>> {
    alt((
        map(number, Some),
        map(word, Some),
        map(times, Some),
        value(None, separator),
    ))(input)
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    match many0(token)(input) {
        Ok((_, tokens)) => tokens.into_iter().flatten().collect(),
        Err(_) => Vec::new(),
    }
}

const HEIGHT: &[&str] = &["height", "high", "tall", "h"];
const WIDTH: &[&str] = &["width", "wide", "w"];
const LENGTH: &[&str] = &["length", "long", "l", "depth", "deep"];
const RADIUS: &[&str] = &["radius", "r"];
const DIAMETER: &[&str] = &["diameter", "across"];
const CUBE_SIDE: &[&str] = &["side", "sides", "size", "edge", "edges", "length", "width"];
const LEGS: &[&str] = &["base", "leg", "legs", "side", "sides", "triangle"];

/// Adjectives follow their number ("4 units high"), nouns precede it
const TRAILING_LABELS: &[&str] = &["high", "tall", "wide", "long", "deep", "across"];

const FILLER: &[&str] = &[
    "of", "is", "are", "equal", "equals", "to", "at", "about", "all", "a", "an", "the",
    "measuring", "be", "set",
];
const UNITS: &[&str] = &[
    "unit", "units", "cm", "mm", "m", "in", "inch", "inches", "ft", "feet", "foot", "meter",
    "meters", "metre", "metres",
];
const JOINERS: &[&str] = &["x", "by", "and"];

/// How far a label may sit from its number
const LABEL_REACH: usize = 4;

struct Scan<'a> {
    tokens: Vec<Token<'a>>,
    claimed: Vec<bool>,
}

impl<'a> Scan<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        let claimed = vec![false; tokens.len()];
        Self { tokens, claimed }
    }

    fn has_word(&self, words: &[&str]) -> bool {
        self.tokens.iter().any(|t| match t {
            Token::Word(w) => words.iter().any(|k| is_word(w, k)),
            Token::Number(_) => false,
        })
    }

    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            Token::Number(v) if *v > 0.0 => Some(*v),
            _ => None,
        })
    }

    fn free_number(&self, index: usize) -> Option<f64> {
        match self.tokens.get(index) {
            Some(Token::Number(v)) if *v > 0.0 && !self.claimed[index] => Some(*v),
            _ => None,
        }
    }

    fn skippable(&self, index: usize, labels: &[&str]) -> bool {
        match self.tokens[index] {
            Token::Word(w) => {
                FILLER.contains(&w) || UNITS.contains(&w) || labels.contains(&w)
            }
            Token::Number(_) => false,
        }
    }

    fn search_forward(&self, from: usize, labels: &[&str]) -> Option<usize> {
        let end = (from + 1 + LABEL_REACH).min(self.tokens.len());
        for i in from + 1..end {
            if self.free_number(i).is_some() {
                return Some(i);
            }
            if !self.skippable(i, labels) {
                break;
            }
        }
        None
    }

    fn search_backward(&self, from: usize, labels: &[&str]) -> Option<usize> {
        let start = from.saturating_sub(LABEL_REACH);
        for i in (start..from).rev() {
            if self.free_number(i).is_some() {
                return Some(i);
            }
            if !self.skippable(i, labels) {
                break;
            }
        }
        None
    }

    /// A number bound to one of `labels` ("height 4", "4 units high")
    fn labeled(&mut self, labels: &[&str]) -> Option<f64> {
        for i in 0..self.tokens.len() {
            let Token::Word(w) = self.tokens[i] else {
                continue;
            };
            if !labels.contains(&w) {
                continue;
            }
            let found = if TRAILING_LABELS.contains(&w) {
                self.search_backward(i, labels)
                    .or_else(|| self.search_forward(i, labels))
            } else {
                self.search_forward(i, labels)
                    .or_else(|| self.search_backward(i, labels))
            };
            if let Some(index) = found {
                self.claimed[index] = true;
                return self.value_at(index);
            }
        }
        None
    }

    fn value_at(&self, index: usize) -> Option<f64> {
        match self.tokens[index] {
            Token::Number(v) => Some(v),
            Token::Word(_) => None,
        }
    }

    /// `count` unclaimed numbers chained by joiners ("3 x 2 x 5", "4 and 5")
    fn chain(&mut self, count: usize, after_label: Option<&[&str]>) -> Option<Vec<f64>> {
        for start in 0..self.tokens.len() {
            if let Some(labels) = after_label {
                let labeled = self.tokens[..start].iter().rev().take(LABEL_REACH).any(
                    |t| matches!(t, Token::Word(w) if labels.contains(w)),
                );
                if !labeled {
                    continue;
                }
            }
            if let Some(indices) = self.chain_at(start, count) {
                let values = indices
                    .iter()
                    .filter_map(|&i| self.value_at(i))
                    .collect();
                for i in indices {
                    self.claimed[i] = true;
                }
                return Some(values);
            }
        }
        None
    }

    fn chain_at(&self, start: usize, count: usize) -> Option<Vec<usize>> {
        self.free_number(start)?;
        let mut indices = vec![start];
        let mut i = start;
        while indices.len() < count {
            let mut next = i + 1;
            while next < self.tokens.len() && self.skippable_unit(next) {
                next += 1;
            }
            match self.tokens.get(next) {
                Some(Token::Word(w)) if JOINERS.contains(w) => {}
                _ => return None,
            }
            let number = next + 1;
            self.free_number(number)?;
            indices.push(number);
            i = number;
        }
        Some(indices)
    }

    fn skippable_unit(&self, index: usize) -> bool {
        matches!(self.tokens[index], Token::Word(w) if UNITS.contains(&w))
    }

    /// Next unclaimed bare number, in reading order
    fn positional(&mut self) -> Option<f64> {
        let index = (0..self.tokens.len()).find(|&i| self.free_number(i).is_some())?;
        self.claimed[index] = true;
        self.value_at(index)
    }
}

fn is_word(word: &str, keyword: &str) -> bool {
    word == keyword || word.strip_suffix('s') == Some(keyword)
}

/// Explicit shape nouns, checked in order
const KIND_WORDS: &[(ShapeKind, &[&str])] = &[
    (ShapeKind::TriangularPrism, &["triangular", "triangle", "wedge"]),
    (ShapeKind::Cube, &["cube", "cubic"]),
    (
        ShapeKind::RectangularPrism,
        &["rectangular", "rectangle", "cuboid", "box", "brick", "prism"],
    ),
    (ShapeKind::Cylinder, &["cylinder", "cylindrical", "tube", "pipe"]),
    (ShapeKind::Cone, &["cone", "conical"]),
    (ShapeKind::Sphere, &["sphere", "spherical", "ball", "globe"]),
];

/// Clues strong enough to pick a kind on their own
const APEX: &[&str] = &["apex", "pointed", "pointy"];
const ROUND: &[&str] = &["round", "rounded"];

/// Weaker clues, only used to split the number-count guess
const TAPER: &[&str] = &["point", "tip", "taper", "tapered"];
const CURVED: &[&str] = &["circular", "circle", "curved"];

fn classify(scan: &Scan<'_>) -> Option<ShapeKind> {
    if let Some((kind, _)) = KIND_WORDS.iter().find(|(_, words)| scan.has_word(words)) {
        return Some(*kind);
    }

    if scan.has_word(APEX) {
        return Some(ShapeKind::Cone);
    }
    if scan.has_word(ROUND) {
        return Some(if scan.has_word(HEIGHT) {
            ShapeKind::Cylinder
        } else {
            ShapeKind::Sphere
        });
    }

    // No kind words at all, go by how many numbers were given
    match scan.numbers().count() {
        1 if scan.has_word(CURVED) => Some(ShapeKind::Sphere),
        1 => Some(ShapeKind::Cube),
        2 if scan.has_word(TAPER) => Some(ShapeKind::Cone),
        2 => Some(ShapeKind::Cylinder),
        3 => Some(ShapeKind::RectangularPrism),
        _ => None,
    }
}

/// Parse free text into a shape descriptor.
pub fn parse(text: &str) -> Result<ShapeDescriptor, ParseFailure> {
    let lowered = text.to_lowercase();
    let mut scan = Scan::new(tokenize(&lowered));

    let Some(kind) = classify(&scan) else {
        let reason = if scan.numbers().next().is_none() {
            "No shape or dimensions found in the description".to_string()
        } else {
            format!(
                "Could not tell which shape {} numbers describe",
                scan.numbers().count()
            )
        };
        return Err(ParseFailure::new(reason));
    };

    let descriptor = extract(kind, &mut scan);
    debug!(?descriptor, text, "parsed shape description");
    Ok(descriptor)
}

fn radius(scan: &mut Scan<'_>) -> Option<f64> {
    scan.labeled(RADIUS)
        .or_else(|| scan.labeled(DIAMETER).map(|d| d / 2.0))
}

fn extract(kind: ShapeKind, scan: &mut Scan<'_>) -> ShapeDescriptor {
    match kind {
        ShapeKind::TriangularPrism => {
            let height = scan.labeled(HEIGHT);
            let (side1, side2) = match scan.chain(2, Some(LEGS)).or_else(|| scan.chain(2, None)) {
                Some(legs) => (Some(legs[0]), Some(legs[1])),
                None => (None, None),
            };
            let side1 = side1.or_else(|| scan.positional()).unwrap_or(4.0);
            let side2 = side2.or_else(|| scan.positional()).unwrap_or(5.0);
            let height = height.or_else(|| scan.positional()).unwrap_or(2.0);
            ShapeDescriptor::triangular_prism(side1, side2, height)
        }
        ShapeKind::RectangularPrism => {
            let width = scan.labeled(WIDTH);
            let height = scan.labeled(HEIGHT);
            let length = scan.labeled(LENGTH);
            if width.is_none() && height.is_none() && length.is_none() {
                if let Some(sides) = scan.chain(3, None) {
                    return ShapeDescriptor::rectangular_prism(sides[0], sides[1], sides[2]);
                }
            }
            let width = width.or_else(|| scan.positional()).unwrap_or(3.0);
            let height = height.or_else(|| scan.positional()).unwrap_or(2.0);
            let length = length.or_else(|| scan.positional()).unwrap_or(5.0);
            ShapeDescriptor::rectangular_prism(width, height, length)
        }
        ShapeKind::Cube => {
            let size = scan
                .labeled(CUBE_SIDE)
                .or_else(|| scan.labeled(HEIGHT))
                .or_else(|| scan.positional())
                .unwrap_or(3.0);
            ShapeDescriptor::cube(size)
        }
        ShapeKind::Cylinder | ShapeKind::Cone => {
            let r = radius(scan);
            let h = scan.labeled(HEIGHT);
            let r = r.or_else(|| scan.positional()).unwrap_or(2.0);
            let h = h.or_else(|| scan.positional()).unwrap_or(4.0);
            if kind == ShapeKind::Cone {
                ShapeDescriptor::cone(r, h)
            } else {
                ShapeDescriptor::cylinder(r, h)
            }
        }
        ShapeKind::Sphere => {
            let r = radius(scan)
                .or_else(|| scan.positional())
                .unwrap_or(2.0);
            ShapeDescriptor::sphere(r)
        }
    }
}
