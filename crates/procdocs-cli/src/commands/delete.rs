use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_delete(ids: &[String], context: &Context) -> Result<(), CliError> {
    let remote = context.connect().await?;
    if remote.session.is_none() {
        return Err(CliError::NotSignedIn);
    }

    let deleted = remote.process_service().delete_processes(ids).await?;
    println!("Deleted {deleted} of {} processes", ids.len());
    if deleted > 0 {
        println!("Run `procdocs sync` to refresh the local cache.");
    }
    Ok(())
}
