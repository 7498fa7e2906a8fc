use chrono::Utc;
use twinboard_lib::MachinesClient;
use twinboard_lib::error::Error;
use twinboard_lib::view::IterationViewer;
use twinboard_lib::view::MachineDetail;
use twinboard_lib::view::ModelIteration;
use twinboard_lib::view::original_visualization;
use uuid::Uuid;

/// Prints the detail page of one machine.
pub async fn run(client: &MachinesClient, id: Uuid) -> Result<(), Error> {
    let machine = client.get(id).await?;
    let detail = MachineDetail::new(&machine, Utc::now());
    print!("{}", detail.render_text(|path| path.to_string()));

    let iterations: Vec<ModelIteration> = machine
        .file_paths
        .modelica_files
        .iter()
        .map(ModelIteration::from)
        .collect();
    let count = iterations.len();
    let mut viewer = IterationViewer::new(iterations, count, count.max(1));
    viewer.select(count.saturating_sub(1));
    println!();
    print!("{}", viewer.render_text(original_visualization(&machine)));
    Ok(())
}
