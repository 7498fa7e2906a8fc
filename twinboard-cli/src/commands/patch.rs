use twinboard_lib::MachinesClient;
use twinboard_lib::error::Error;
use twinboard_lib::model::MachinePatch;
use twinboard_lib::model::MachineStatus;
use uuid::Uuid;

pub async fn run(
    client: &MachinesClient,
    id: Uuid,
    status: Option<MachineStatus>,
    accuracy: Option<f64>,
) -> Result<(), Error> {
    let patch = MachinePatch {
        status,
        accuracy,
        ..MachinePatch::default()
    };
    let machine = client.patch(id, &patch).await?;
    println!(
        "{}: status {}, accuracy {}",
        machine.name,
        machine.status,
        machine
            .accuracy
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}
