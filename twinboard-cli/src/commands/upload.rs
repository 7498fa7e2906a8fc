use std::path::Path;

use twinboard_lib::MachinesClient;
use twinboard_lib::error::Error;
use twinboard_lib::view::UploadForm;
use twinboard_lib::view::MISSING_FIELDS;
use twinboard_lib::view::UPLOAD_FAILED;

/// Uploads a dataset through the same checks as the upload form.
pub async fn run(client: &MachinesClient, name: String, file: &Path) -> Result<(), Error> {
    let bytes = tokio::fs::read(file).await?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.json".to_string());

    let mut form = UploadForm::new();
    form.set_name(name);
    form.select_file(file_name, bytes);

    let Some(data) = form.preview() else {
        return Err(Error::Form(form.error().unwrap_or(UPLOAD_FAILED)));
    };
    println!(
        "Uploading {} data points across {} fields...",
        data.data_points(),
        data.fields.len()
    );

    match form.submit(client).await {
        Some(machine) => {
            println!("Created machine {} ({})", machine.name, machine.id);
            Ok(())
        }
        None => Err(Error::Form(form.error().unwrap_or(MISSING_FIELDS))),
    }
}
