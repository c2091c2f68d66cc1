use crate::commands::common::{format_record_lines, record_to_list_item, Context, RecordListItem};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, context: &Context) -> Result<(), CliError> {
    let records = context.open_cache().await?.load().await;
    let shown = &records[..limit.min(records.len())];

    if as_json {
        let json_items = shown
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("No cached processes. Run `procdocs sync` first.");
    } else {
        for line in format_record_lines(shown) {
            println!("{line}");
        }
    }

    Ok(())
}
