//! JSONL tracing layer.
//!
//! Each event becomes one [`LogRecord`] line on the writer (stderr in the
//! binary), leaving stdout to command payloads. `run_id`, `stage` and `tool`
//! recorded on enclosing spans are inherited by the events inside them; the
//! innermost span that sets a key wins, and a key set on the event itself
//! beats every span.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// One output line.
#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: String,
    level: Level,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
}

/// Span fields that flow down to events.
#[derive(Debug, Clone, Default)]
struct Inherited {
    run_id: Option<String>,
    stage: Option<String>,
    tool: Option<String>,
}

impl Inherited {
    fn from_fields(fields: &mut FieldCollector) -> Self {
        Inherited {
            run_id: fields.take_string("run_id"),
            stage: fields.take_string("stage"),
            tool: fields.take_string("tool"),
        }
    }

    /// Fill keys still unset from an enclosing span.
    fn inherit(&mut self, outer: &Inherited) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&outer.run_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&outer.stage);
        }
        if self.tool.is_none() {
            self.tool.clone_from(&outer.tool);
        }
    }
}

/// Records tracing fields as JSON values, keyed by field name.
#[derive(Debug, Default)]
struct FieldCollector {
    values: Map<String, Value>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: Value) {
        self.values.insert(field.name().to_owned(), value);
    }

    fn take_string(&mut self, name: &str) -> Option<String> {
        match self.values.remove(name)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_owned()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // utilities can be NaN or infinite, which JSON numbers cannot hold
        let v = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, v);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// Tracing layer writing one JSON object per event.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }

    fn emit(&self, record: &LogRecord<'_>) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut()
                .insert(Inherited::from_fields(&mut fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields.take_string("message");
        let mut context = Inherited {
            stage: fields.take_string("stage"),
            ..Inherited::default()
        };
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<Inherited>() {
                    context.inherit(outer);
                }
            }
        }
        if let Some(tool) = context.tool {
            fields
                .values
                .entry("tool".to_owned())
                .or_insert(Value::String(tool));
        }

        let metadata = event.metadata();
        self.emit(&LogRecord {
            ts: Utc::now().to_rfc3339(),
            level: (*metadata.level()).into(),
            event: metadata.target(),
            run_id: context.run_id,
            stage: context.stage,
            message,
            fields: fields.values,
        });
    }
}
