use crate::commands::common::{
    find_records, format_record_detail, normalize_search_query, record_to_list_item, Context,
    RecordListItem,
};
use crate::error::CliError;

pub async fn run_show(query: &str, as_json: bool, context: &Context) -> Result<(), CliError> {
    let query = normalize_search_query(query)?;
    let records = context.open_cache().await?.load().await;
    let matches = find_records(&records, &query);
    if matches.is_empty() {
        return Err(CliError::NoMatch(query));
    }

    if as_json {
        let json_items = matches
            .into_iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    let rendered = matches
        .into_iter()
        .map(format_record_detail)
        .collect::<Vec<_>>();
    println!("{}", rendered.join("\n\n"));
    Ok(())
}
