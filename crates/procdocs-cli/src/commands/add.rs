use std::path::PathBuf;

use procdocs_core::media::load_image_attachment;
use procdocs_core::services::NewProcess;

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_add(
    title: &str,
    description: &str,
    image_paths: &[PathBuf],
    context: &Context,
) -> Result<(), CliError> {
    let images = image_paths
        .iter()
        .map(|path| load_image_attachment(path))
        .collect::<Result<Vec<_>, _>>()?;

    let remote = context.connect().await?;
    let Some(session) = remote.session.as_ref() else {
        return Err(CliError::NotSignedIn);
    };

    let draft = NewProcess::new(title, description, images);
    let created = remote
        .process_service()
        .create_process(draft, Some(session.user.id.clone()))
        .await?;

    println!("{}", created.record.id);
    if let Some(warning) = created.warning() {
        eprintln!("Warning: process saved, but refreshing the cache failed: {warning}");
    }
    Ok(())
}
