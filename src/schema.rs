//! Movie input schema.
//!
//! Write payloads arrive as raw JSON and are checked field by field here,
//! so that type mismatches come back as violations instead of
//! deserialization failures. Both modes are strict: keys outside the movie
//! schema (including `id`) are rejected.

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::models::{Genre, MoviePatch, NewMovie};

pub const MIN_YEAR: i32 = 1900;
pub const DEFAULT_RATING: f64 = 5.0;
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// Mutable movie fields, in reporting order.
pub const FIELDS: [&str; 7] = [
    "title", "year", "director", "duration", "rating", "poster", "genre",
];

/// Reported when the body itself is not a JSON object.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summarize(.violations))]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![Violation::new(field, message)])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|violation| violation.field == field)
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    Partial,
}

/// Accepted shape of a movie record.
///
/// Unless pinned with [`MovieSchema::with_max_year`], the upper year bound
/// is the current UTC year + 1 at the time of each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieSchema {
    min_year: i32,
    max_year: Option<i32>,
}

impl Default for MovieSchema {
    fn default() -> Self {
        Self {
            min_year: MIN_YEAR,
            max_year: None,
        }
    }
}

impl MovieSchema {
    pub fn with_max_year(max_year: i32) -> Self {
        Self {
            min_year: MIN_YEAR,
            max_year: Some(max_year),
        }
    }

    pub fn max_year(&self) -> i32 {
        self.max_year.unwrap_or_else(|| Utc::now().year() + 1)
    }

    /// Full validation, used on create. `rating` defaults to 5.
    pub fn validate_full(&self, input: &Value) -> Result<NewMovie, ValidationErrors> {
        let object = as_object(input)?;
        let mut checker = FieldChecker::new(object, Mode::Full);

        let title = checker.take("title", non_blank_text);
        let year = checker.take("year", |value| self.year(value));
        let director = checker.take("director", non_blank_text);
        let duration = checker.take("duration", duration);
        let rating = checker
            .take_optional("rating", rating)
            .unwrap_or(DEFAULT_RATING);
        let poster = checker.take("poster", poster);
        let genre = checker.take("genre", genres);

        let violations = checker.finish();
        if !violations.is_empty() {
            return Err(ValidationErrors::new(violations));
        }

        match (title, year, director, duration, poster, genre) {
            (Some(title), Some(year), Some(director), Some(duration), Some(poster), Some(genre)) => {
                Ok(NewMovie {
                    title,
                    year,
                    director,
                    duration,
                    rating,
                    poster,
                    genre,
                })
            }
            // every `None` above has already pushed a violation
            _ => Err(ValidationErrors::single(BODY_FIELD, "incomplete movie")),
        }
    }

    /// Partial validation, used on update. An empty object is a valid no-op.
    pub fn validate_partial(&self, input: &Value) -> Result<MoviePatch, ValidationErrors> {
        let object = as_object(input)?;
        let mut checker = FieldChecker::new(object, Mode::Partial);

        let patch = MoviePatch {
            title: checker.take("title", non_blank_text),
            year: checker.take("year", |value| self.year(value)),
            director: checker.take("director", non_blank_text),
            duration: checker.take("duration", duration),
            rating: checker.take("rating", rating),
            poster: checker.take("poster", poster),
            genre: checker.take("genre", genres),
        };

        let violations = checker.finish();
        if violations.is_empty() {
            Ok(patch)
        } else {
            Err(ValidationErrors::new(violations))
        }
    }

    fn year(&self, value: &Value) -> Result<i32, Vec<String>> {
        let year = integer(value)?;
        let max_year = self.max_year();
        if year < i64::from(self.min_year) || year > i64::from(max_year) {
            return Err(vec![format!(
                "must be between {} and {max_year}",
                self.min_year
            )]);
        }
        // bounded by the window above
        i32::try_from(year).map_err(|_| vec!["is out of range".to_string()])
    }
}

struct FieldChecker<'a> {
    object: &'a Map<String, Value>,
    mode: Mode,
    violations: Vec<Violation>,
}

impl<'a> FieldChecker<'a> {
    fn new(object: &'a Map<String, Value>, mode: Mode) -> Self {
        Self {
            object,
            mode,
            violations: Vec::new(),
        }
    }

    /// Required in full mode, optional in partial mode.
    fn take<T>(
        &mut self,
        field: &'static str,
        check: impl FnOnce(&Value) -> Result<T, Vec<String>>,
    ) -> Option<T> {
        if self.mode == Mode::Full && !self.object.contains_key(field) {
            self.violations.push(Violation::new(field, "is required"));
            return None;
        }
        self.take_optional(field, check)
    }

    fn take_optional<T>(
        &mut self,
        field: &'static str,
        check: impl FnOnce(&Value) -> Result<T, Vec<String>>,
    ) -> Option<T> {
        let value = self.object.get(field)?;
        match check(value) {
            Ok(parsed) => Some(parsed),
            Err(messages) => {
                self.violations.extend(
                    messages
                        .into_iter()
                        .map(|message| Violation::new(field, message)),
                );
                None
            }
        }
    }

    fn finish(mut self) -> Vec<Violation> {
        for key in self.object.keys() {
            if !FIELDS.contains(&key.as_str()) {
                self.violations
                    .push(Violation::new(key.as_str(), "unrecognized key"));
            }
        }
        self.violations
    }
}

fn as_object(input: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    input.as_object().ok_or_else(|| {
        ValidationErrors::single(
            BODY_FIELD,
            format!("expected an object, received {}", type_name(input)),
        )
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &str, value: &Value) -> Vec<String> {
    vec![format!("expected {expected}, received {}", type_name(value))]
}

fn non_blank_text(value: &Value) -> Result<String, Vec<String>> {
    match value {
        Value::String(text) if text.trim().is_empty() => {
            Err(vec!["must not be empty".to_string()])
        }
        Value::String(text) => Ok(text.clone()),
        other => Err(mismatch("a string", other)),
    }
}

/// Integral floats such as `2000.0` are accepted.
fn integer(value: &Value) -> Result<i64, Vec<String>> {
    let Value::Number(number) = value else {
        return Err(mismatch("an integer", value));
    };
    if let Some(int) = number.as_i64() {
        return Ok(int);
    }
    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0.0 && float.abs() < 9.0e15 => {
            Ok(float as i64)
        }
        _ => Err(vec!["expected an integer, received a fractional or out-of-range number".to_string()]),
    }
}

fn duration(value: &Value) -> Result<u32, Vec<String>> {
    let minutes = integer(value)?;
    if minutes <= 0 {
        return Err(vec!["must be a positive number of minutes".to_string()]);
    }
    u32::try_from(minutes).map_err(|_| vec!["is too large".to_string()])
}

fn rating(value: &Value) -> Result<f64, Vec<String>> {
    let Some(rating) = value.as_f64() else {
        return Err(mismatch("a number", value));
    };
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(vec![format!(
            "must be between {MIN_RATING} and {MAX_RATING}"
        )]);
    }
    Ok(rating)
}

fn poster(value: &Value) -> Result<String, Vec<String>> {
    let Value::String(raw) = value else {
        return Err(mismatch("a string", value));
    };
    Url::parse(raw)
        .map(|_| raw.clone())
        .map_err(|err| vec![format!("must be a valid URL ({err})")])
}

fn genres(value: &Value) -> Result<Vec<Genre>, Vec<String>> {
    let Value::Array(items) = value else {
        return Err(mismatch("an array of genres", value));
    };
    if items.is_empty() {
        return Err(vec!["must contain at least one genre".to_string()]);
    }

    let mut parsed = Vec::with_capacity(items.len());
    let mut messages = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(name) => match Genre::from_name(name) {
                Some(genre) => parsed.push(genre),
                None => messages.push(format!(
                    "item {index}: '{name}' is not one of {}",
                    known_genres()
                )),
            },
            other => messages.push(format!(
                "item {index}: expected a string, received {}",
                type_name(other)
            )),
        }
    }

    if messages.is_empty() {
        Ok(parsed)
    } else {
        Err(messages)
    }
}

fn known_genres() -> String {
    Genre::ALL
        .iter()
        .map(|genre| genre.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
