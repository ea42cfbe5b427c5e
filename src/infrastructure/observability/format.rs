use chrono::Local;
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Line format for the log file:
/// `2026-10-18 09:15:02,417 INFO: Microblog startup [in src/bootstrap.rs:88]`
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFormat;

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        write!(
            writer,
            "{} {}: ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            metadata.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(
            writer,
            " [in {}:{}]",
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0)
        )
    }
}
