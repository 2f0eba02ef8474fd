//! CSV touch traces and deterministic replay.
//!
//! One frame per line:
//!
//! ```text
//! # t_ms kind contacts
//! frame,0,start,1:100:200
//! frame,16,move,1:104:200;2:300:200
//! frame,32,end,
//! ```
//!
//! Blank lines and `#` comments are skipped.

use std::{fs, path::Path};

use thiserror::Error;

use crate::{
    config::{ConfigError, GestureConfig},
    engine::GestureEngine,
    event::{GestureDetail, GestureEvent, GestureKind},
    types::{Point, RawContact, RawTouchFrame, RawTouchKind},
};

/// Time advanced past the last frame so armed windows and long-presses fire.
pub const DEFAULT_TAIL_MS: u64 = 1_000;

pub const EVENT_HEADER: &str = "event,t_ms,kind,x,y,a,b";

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl TraceError {
    fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub fn read_trace(path: &Path) -> Result<Vec<RawTouchFrame>, TraceError> {
    parse_trace(&read(path)?)
}

pub fn read_expected_kinds(path: &Path) -> Result<Vec<GestureKind>, TraceError> {
    parse_expected_kinds(&read(path)?)
}

fn read(path: &Path) -> Result<String, TraceError> {
    fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse_trace(input: &str) -> Result<Vec<RawTouchFrame>, TraceError> {
    let mut frames = Vec::new();
    let mut last_ms = 0u64;
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.splitn(4, ',').collect();
        if parts.len() < 3 {
            return Err(TraceError::parse(
                line_no,
                "expected `frame,<t_ms>,<kind>,<contacts>`",
            ));
        }
        if parts[0].trim() != "frame" {
            return Err(TraceError::parse(
                line_no,
                format!("unknown record `{}`", parts[0].trim()),
            ));
        }

        let raw_ms = parts[1].trim();
        let t_ms = raw_ms
            .parse::<u64>()
            .map_err(|e| TraceError::parse(line_no, format!("invalid t_ms '{raw_ms}': {e}")))?;
        if t_ms < last_ms {
            return Err(TraceError::parse(
                line_no,
                format!("t_ms {t_ms} goes backwards from {last_ms}"),
            ));
        }
        last_ms = t_ms;

        let kind = parse_kind(parts[2]).ok_or_else(|| {
            TraceError::parse(line_no, format!("invalid kind '{}'", parts[2].trim()))
        })?;
        let contacts = match parts.get(3) {
            Some(field) => parse_contacts(field, line_no)?,
            None => Vec::new(),
        };

        frames.push(RawTouchFrame::new(kind, t_ms, contacts));
    }
    Ok(frames)
}

fn parse_kind(raw: &str) -> Option<RawTouchKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "start" => Some(RawTouchKind::Start),
        "move" => Some(RawTouchKind::Move),
        "end" => Some(RawTouchKind::End),
        "cancel" => Some(RawTouchKind::Cancel),
        _ => None,
    }
}

fn parse_contacts(field: &str, line_no: usize) -> Result<Vec<RawContact>, TraceError> {
    let mut contacts = Vec::new();
    for entry in field.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let mut fields = entry.split(':');
        let (Some(id), Some(x), Some(y), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(TraceError::parse(
                line_no,
                format!("contact '{entry}' must be <id>:<x>:<y>"),
            ));
        };
        let id = id
            .trim()
            .parse::<i64>()
            .map_err(|e| TraceError::parse(line_no, format!("invalid contact id '{id}': {e}")))?;
        // Non-finite coordinates are kept; the normalizer drops them.
        let x = parse_coord(x, line_no)?;
        let y = parse_coord(y, line_no)?;
        contacts.push(RawContact { id, x, y });
    }
    Ok(contacts)
}

fn parse_coord(raw: &str, line_no: usize) -> Result<f32, TraceError> {
    let raw = raw.trim();
    raw.parse::<f32>()
        .map_err(|e| TraceError::parse(line_no, format!("invalid coordinate '{raw}': {e}")))
}

/// One gesture kind per line, as printed by the replay tool.
pub fn parse_expected_kinds(input: &str) -> Result<Vec<GestureKind>, TraceError> {
    let mut kinds = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        let kind = token
            .parse::<GestureKind>()
            .map_err(|err| TraceError::parse(idx + 1, err.to_string()))?;
        kinds.push(kind);
    }
    Ok(kinds)
}

/// Replays `frames` through a fresh engine, then advances `tail_ms` past the
/// last frame.
pub fn replay(
    config: GestureConfig,
    frames: &[RawTouchFrame],
    tail_ms: u64,
) -> Result<Vec<GestureEvent>, ConfigError> {
    let mut engine = GestureEngine::new(config)?;
    Ok(replay_into(&mut engine, frames, tail_ms))
}

pub fn replay_into(
    engine: &mut GestureEngine,
    frames: &[RawTouchFrame],
    tail_ms: u64,
) -> Vec<GestureEvent> {
    let mut events = Vec::new();
    for frame in frames {
        events.extend(engine.handle(frame));
    }
    if let Some(last) = frames.last() {
        events.extend(engine.advance(last.t_ms.saturating_add(tail_ms)));
    }
    events
}

/// `event,<t_ms>,<kind>,<x>,<y>,<a>,<b>`; `a`/`b` depend on the kind.
pub fn format_event_row(event: &GestureEvent) -> String {
    let (point, a, b) = match event.detail {
        GestureDetail::Tap(d) | GestureDetail::DoubleTap(d) | GestureDetail::MultiTap(d) => {
            (d.position, d.tap_count.to_string(), d.duration_ms.to_string())
        }
        GestureDetail::LongPress(d) => (d.position, d.duration_ms.to_string(), String::new()),
        GestureDetail::SwipeStart(d) | GestureDetail::SwipeMove(d) | GestureDetail::SwipeEnd(d) => {
            (
                Point::new(d.delta_x, d.delta_y),
                d.direction.as_str().to_string(),
                format!("{:.1}", d.distance),
            )
        }
        GestureDetail::PinchStart(d) | GestureDetail::PinchMove(d) | GestureDetail::PinchEnd(d) => {
            (d.center, format!("{:.3}", d.scale), format!("{:.3}", d.delta_scale))
        }
        GestureDetail::RotateStart(d)
        | GestureDetail::RotateMove(d)
        | GestureDetail::RotateEnd(d) => (
            d.center,
            format!("{:.1}", d.rotation_deg),
            format!("{:.1}", d.delta_deg),
        ),
        GestureDetail::Cancel { position } => (position, String::new(), String::new()),
    };
    format!(
        "event,{},{},{:.1},{:.1},{},{}",
        event.t_ms,
        event.kind(),
        point.x,
        point.y,
        a,
        b
    )
}
