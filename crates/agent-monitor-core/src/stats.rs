//! Stats aggregation over the stored events.

use agent_monitor_types::{ToolCategory, ToolEvent, ToolStats};

/// Build the [`ToolStats`] aggregate from events in store order.
pub fn aggregate<'a, I>(events: I, total_ingested: u64, subscribers: usize) -> ToolStats
where
    I: IntoIterator<Item = &'a ToolEvent>,
{
    let mut stats = ToolStats {
        total_ingested,
        subscribers: u64::try_from(subscribers).unwrap_or(u64::MAX),
        ..ToolStats::default()
    };

    for event in events {
        stats.total_events = stats.total_events.saturating_add(1);
        if stats.first_id.is_none() {
            stats.first_id = Some(event.id());
        }
        stats.last_id = Some(event.id());

        let tool = event.tool_name();
        let category = ToolCategory::classify(tool);
        bump(stats.tool_counts.entry(tool.to_owned()).or_default());
        bump(stats.category_counts.entry(category).or_default());

        if let Some(path) = event.file_path() {
            match category {
                ToolCategory::Read => {
                    stats.files_read.insert(path.to_owned());
                }
                ToolCategory::Write => {
                    stats.files_written.insert(path.to_owned());
                }
                _ => {}
            }
            stats.files_touched.insert(path.to_owned());
        }
    }

    stats
}

fn bump(count: &mut u64) {
    *count = count.saturating_add(1);
}
