use twinboard_lib::MachinesClient;
use twinboard_lib::error::Error;
use twinboard_lib::model::MachineSummary;
use twinboard_lib::table::TableController;
use twinboard_lib::table::TableSettings;
use twinboard_lib::table::callbacks;
use twinboard_lib::table::machine_columns;

/// Prints every machine as a single table page.
pub async fn run(client: &MachinesClient) -> Result<(), Error> {
    let machines = client.list().await?;
    let settings = TableSettings::new("").with_page_size(machines.len().max(1));
    let mut table: TableController<MachineSummary> = TableController::new(
        machine_columns(),
        machines,
        settings,
        callbacks(|| {}, || {}),
        false,
        false,
    );
    print!("{}", table.render_text());
    Ok(())
}
